#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gamepath_api::auth::token::create_access_token;
use gamepath_api::config::AppConfig;
use gamepath_api::engine::RecommendationService;
use gamepath_api::metrics::ServiceMetrics;
use gamepath_api::models::{InMemoryModelCache, ModelStore};
use gamepath_api::state::AppState;
use gamepath_api::store::{StoreActor, StoreClient, SubscriptionTier, User, UserSettings};
use tempfile::TempDir;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const TEST_INSTANCE_ID: &str = "test-instance";

/// Service wired against a throwaway record store; no model artifacts on disk
pub struct TestApp {
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub fn store(&self) -> &StoreClient {
        &self.state.store
    }
}

pub fn create_test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.environment = "test".to_string();
    config.server.instance_id = Some(TEST_INSTANCE_ID.to_string());
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    config.auth.api_keys = vec![TEST_API_KEY.to_string()];
    config.storage.path = dir.path().join("records");
    config.storage.seed_games = false;
    config.models.dir = dir.path().join("models");
    config.logging.log_dir = dir.path().join("logs").display().to_string();
    config
}

pub fn create_test_app() -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&dir);

    let actor = StoreActor::new(&config.storage.path, None).expect("Failed to open record store");
    let store = StoreClient::new(kameo::spawn(actor));

    let models = ModelStore::new(
        Arc::new(InMemoryModelCache::new()),
        &config.models.dir,
        Duration::from_secs(60),
    );
    let recommender = RecommendationService::new(models);
    let metrics = ServiceMetrics::new().expect("Failed to create metrics");

    TestApp {
        state: AppState::new(config, store, recommender, metrics),
        _dir: dir,
    }
}

/// Insert a user directly and return it with a valid bearer token
pub async fn create_test_user(app: &TestApp, email: &str) -> (User, String) {
    let user = User {
        id: format!("user_{}", email.replace(['@', '.'], "_")),
        email: email.to_string(),
        username: email.split('@').next().unwrap_or("player").to_string(),
        hashed_password: "not-a-real-hash".to_string(),
        tier: SubscriptionTier::Free,
        created_at: Utc::now(),
        avatar_url: None,
        bio: None,
        settings: UserSettings::default(),
    };
    app.store().put_user(user.clone()).await.expect("Failed to store user");

    let token = create_access_token(TEST_JWT_SECRET, &user.id, &user.email, chrono::Duration::minutes(30))
        .expect("Failed to sign token");
    (user, format!("Bearer {}", token))
}
