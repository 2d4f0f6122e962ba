use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use gamepath_api::api;
use gamepath_api::common::constants::{API_VERSION, SERVICE_NAME};
use gamepath_api::config::AppConfig;
use gamepath_api::engine::RecommendationService;
use gamepath_api::game_detection::{detect_all_games, seed_games};
use gamepath_api::logging::{cleanup_old_logs, init_dual_logging, init_simple_logging};
use gamepath_api::metrics::ServiceMetrics;
use gamepath_api::models::{InMemoryModelCache, ModelCache, ModelStore};
use gamepath_api::state::AppState;
use gamepath_api::store::{StoreActor, StoreClient};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Logging is not up yet, so config problems go to stdout
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("✅ Loaded configuration");
            config
        }
        Err(e) => {
            println!("⚠️ Failed to load configuration: {}. Using default configuration", e);
            AppConfig::default()
        }
    };

    let _logging_guard = match init_dual_logging(&config.logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("❌ Failed to initialize logging system: {}", e);
            if let Err(e) = init_simple_logging(&config.logging.level_filter) {
                eprintln!("❌ Fallback logging unavailable: {}", e);
            }
            error!("⚠️ Using fallback console-only logging due to error: {}", e);
            None
        }
    };

    match cleanup_old_logs(Path::new(&config.logging.log_dir), config.logging.keep_days) {
        Ok(0) => {}
        Ok(removed) => info!("🧹 Removed {} old log files", removed),
        Err(e) => warn!("⚠️ Failed to clean up old log files: {}", e),
    }

    info!(
        service = SERVICE_NAME,
        version = API_VERSION,
        environment = %config.server.environment,
        instance_id = config.instance_id(),
        host = %config.server.host,
        port = config.server.port,
        storage_path = %config.storage.path.display(),
        models_dir = %config.models.dir.display(),
        model_cache_ttl = config.models.cache_ttl_seconds,
        redis_configured = config.models.redis_url.is_some(),
        log_dir = %config.logging.log_dir,
        "🔧 Service configuration"
    );

    if let Err(e) = run(config).await {
        error!("💥 Service failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "redis")]
async fn model_cache(config: &AppConfig) -> Arc<dyn ModelCache> {
    if let Some(url) = config.models.redis_url.as_deref() {
        match gamepath_api::models::RedisModelCache::connect(url).await {
            Ok(cache) => return Arc::new(cache),
            Err(e) => warn!("⚠️ Redis model cache unavailable ({}), using in-process cache", e),
        }
    }
    Arc::new(InMemoryModelCache::new())
}

#[cfg(not(feature = "redis"))]
async fn model_cache(config: &AppConfig) -> Arc<dyn ModelCache> {
    if config.models.redis_url.is_some() {
        warn!("⚠️ REDIS_URL is set but the redis feature is disabled, using in-process cache");
    }
    Arc::new(InMemoryModelCache::new())
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let started = std::time::Instant::now();

    let store_actor = StoreActor::new(&config.storage.path, config.map_size_bytes())?;
    let store = StoreClient::new(kameo::spawn(store_actor));
    info!("🗄️ Record store ready at {}", config.storage.path.display());

    if config.is_development() && config.storage.seed_games {
        match seed_games(&store, detect_all_games()).await {
            Ok(0) => info!("🎮 Game catalog already populated"),
            Ok(seeded) => info!("🎮 Seeded {} games", seeded),
            Err(e) => warn!("⚠️ Failed to seed game catalog: {}", e),
        }
    }

    let cache = model_cache(&config).await;
    let models = ModelStore::new(
        cache,
        &config.models.dir,
        Duration::from_secs(config.models.cache_ttl_seconds),
    );
    let recommender = RecommendationService::new(models);
    let metrics = ServiceMetrics::new()?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(config, store, recommender, metrics);
    info!("✅ Startup completed in {:?}", started.elapsed());

    api::serve(state, addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown signal received");
    })
    .await?;

    info!("🏁 Graceful shutdown completed");
    Ok(())
}
