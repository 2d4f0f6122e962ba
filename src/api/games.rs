//! Game catalog, client registration and metric-driven game optimization.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::filters::{json_body, json_reply, with_state, with_user};
use crate::common::constants::{DEFAULT_LIST_LIMIT, DEFAULT_METRICS_LIMIT, OPTIMIZATION_LOOKBACK_DAYS};
use crate::engine::types::ValidationError;
use crate::engine::{
    generate_steps, NetworkAnalysis, NetworkOptimizer, OptimizationStep, SystemAnalysis, SystemOptimizer, Validate,
};
use crate::error::ApiError;
use crate::game_detection::detect_all_games;
use crate::state::AppState;
use crate::store::{Game, MetricQuery, MetricSample, MetricType, OptimizationRecord, User, UserGame};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRegistration {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub source: String,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub install_path: Option<String>,
    #[serde(default)]
    pub executable_path: Option<String>,
    #[serde(default = "default_true")]
    pub is_detected: bool,
    #[serde(default)]
    pub is_optimized: bool,
    #[serde(default)]
    pub last_optimized: Option<chrono::DateTime<Utc>>,
}

/// Path segments under /api/games that name collection routes, never a game id
const RESERVED_GAME_SEGMENTS: [&str; 2] = ["detected", "register"];

fn default_platforms() -> Vec<String> {
    vec!["PC".to_string()]
}

fn default_true() -> bool {
    true
}

impl GameRegistration {
    /// Overlay the registration on an existing record, or build a new one
    fn apply_to(self, existing: Option<Game>) -> Game {
        let mut game = existing.unwrap_or_else(|| Game {
            id: self.id.clone(),
            name: String::new(),
            slug: String::new(),
            genre: None,
            publisher: None,
            release_year: None,
            platforms: Vec::new(),
            is_detected: false,
            is_optimized: false,
            last_optimized: None,
            optimization_type: None,
            performance_metrics: None,
            source: None,
            app_id: None,
            install_path: None,
            executable_path: None,
            detected_at: None,
            last_detected_at: None,
        });
        game.name = self.name;
        game.slug = self.slug;
        game.source = Some(self.source);
        game.app_id = self.app_id;
        game.genre = self.genre;
        game.publisher = self.publisher;
        game.release_year = self.release_year;
        game.platforms = self.platforms;
        game.install_path = self.install_path;
        game.executable_path = self.executable_path;
        game.is_detected = self.is_detected;
        game.is_optimized = self.is_optimized;
        game.last_optimized = self.last_optimized;
        game
    }
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "Field must not be empty"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct GameRegistrationBatch(pub Vec<GameRegistration>);

impl Validate for GameRegistrationBatch {
    fn validate(&self) -> Result<(), ValidationError> {
        self.0.iter().try_for_each(|game| {
            require("id", &game.id)?;
            require("name", &game.name)?;
            require("slug", &game.slug)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameOptimizationRequest {
    #[serde(rename = "optimizationTypes")]
    pub optimization_types: Vec<String>,
    #[serde(default = "empty_object")]
    pub settings: serde_json::Value,
    #[serde(default = "default_true")]
    pub collect_metrics: bool,
}

pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Validate for GameOptimizationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.optimization_types.is_empty() {
            return Err(ValidationError::new("optimizationTypes", "At least one optimization type is required"));
        }
        if let Some(unknown) = self
            .optimization_types
            .iter()
            .find(|t| !matches!(t.as_str(), "network" | "system" | "both"))
        {
            return Err(ValidationError::new("optimizationTypes", &format!("Unknown optimization type: {}", unknown)));
        }
        Ok(())
    }
}

impl GameOptimizationRequest {
    fn wants(&self, kind: &str) -> bool {
        self.optimization_types.iter().any(|t| t == kind || t == "both")
    }

    /// Collapse the requested kinds to `network`, `system` or `both`
    fn optimization_type(&self) -> &'static str {
        match (self.wants("network"), self.wants("system")) {
            (true, false) => "network",
            (false, true) => "system",
            _ => "both",
        }
    }
}

#[derive(Debug, Serialize)]
struct IssuesDetected {
    system: serde_json::Value,
    network: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameOptimizationResponse {
    success: bool,
    optimization_id: String,
    estimated_completion_time: u32,
    applied_settings: serde_json::Value,
    steps: Vec<OptimizationStep>,
    #[serde(rename = "issues_detected")]
    issues_detected: IssuesDetected,
    #[serde(rename = "requires_client")]
    requires_client: bool,
    game: Game,
}

fn analysis_json<T: Serialize>(analysis: Option<&T>) -> Result<serde_json::Value, ApiError> {
    match analysis {
        Some(analysis) => serde_json::to_value(analysis).map_err(|e| ApiError::Internal(e.to_string())),
        None => Ok(empty_object()),
    }
}

async fn list_games(_user: User, state: AppState) -> Result<Response, Rejection> {
    let games = state.store.list_games(DEFAULT_LIST_LIMIT).await.map_err(ApiError::from)?;
    Ok(json_reply(&games))
}

async fn get_game(game_id: String, _user: User, state: AppState) -> Result<Response, Rejection> {
    let game = state.store.get_game(&game_id).await.map_err(ApiError::from)?;
    let game = game.ok_or_else(|| ApiError::not_found("Game"))?;
    Ok(json_reply(&game))
}

async fn detected_games(user: User, state: AppState) -> Result<Response, Rejection> {
    let relations = state.store.get_user_games(&user.id).await.map_err(ApiError::from)?;

    if relations.is_empty() {
        let games: Vec<Game> = state
            .store
            .list_games(DEFAULT_LIST_LIMIT)
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .filter(|g| g.is_detected)
            .collect();
        return Ok(json_reply(&games));
    }

    let mut games = Vec::with_capacity(relations.len());
    for relation in relations {
        match state.store.get_game(&relation.game_id).await.map_err(ApiError::from)? {
            Some(game) => games.push(game),
            None => warn!("⚠️ User {} linked to missing game {}", user.id, relation.game_id),
        }
    }
    Ok(json_reply(&games))
}

async fn register_games(user: User, batch: GameRegistrationBatch, state: AppState) -> Result<Response, Rejection> {
    let now = Utc::now();
    let mut registered = Vec::with_capacity(batch.0.len());

    for registration in batch.0 {
        let existing = state.store.get_game(&registration.id).await.map_err(ApiError::from)?;
        let is_new = existing.is_none();

        let mut game = registration.apply_to(existing);
        if is_new {
            game.detected_at = Some(now);
        } else {
            game.last_detected_at = Some(now);
        }
        state.store.put_game(game.clone()).await.map_err(ApiError::from)?;

        if is_new {
            let mut relation = UserGame::new(&user.id, &game.id);
            relation.detected_at = Some(now);
            relation.detection_method = Some("client".to_string());
            state.store.put_user_game(relation).await.map_err(ApiError::from)?;
        }
        registered.push(game);
    }

    info!("🎮 User {} registered {} games", user.id, registered.len());
    Ok(json_reply(&registered))
}

/// Most recent samples of one game inside the lookback window, oldest first
async fn load_samples(
    state: &AppState,
    user_id: &str,
    game_id: &str,
    metric_type: MetricType,
) -> Result<Vec<MetricSample>, ApiError> {
    let end = Utc::now();
    let start = end - Duration::days(OPTIMIZATION_LOOKBACK_DAYS);
    let query = MetricQuery::new(start, end, DEFAULT_METRICS_LIMIT)
        .of_type(Some(metric_type))
        .for_game(game_id);
    let mut samples = state.store.query_metrics(user_id, query).await?;
    samples.reverse();
    Ok(samples)
}

async fn optimize_game(
    game_id: String,
    user: User,
    request: GameOptimizationRequest,
    state: AppState,
) -> Result<Response, Rejection> {
    let mut game = state
        .store
        .get_game(&game_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Game"))?;

    let mut steps = Vec::new();
    let mut system_analysis: Option<SystemAnalysis> = None;
    let mut network_analysis: Option<NetworkAnalysis> = None;

    if request.wants("system") {
        let samples = if request.collect_metrics {
            load_samples(&state, &user.id, &game_id, MetricType::System).await?
        } else {
            Vec::new()
        };
        let readings: Vec<_> = samples.iter().filter_map(|s| s.system().cloned()).collect();
        let analysis = if readings.is_empty() {
            SystemOptimizer::default_analysis()
        } else {
            SystemOptimizer::analyze(&readings, &game_id)
        };
        steps.extend(generate_steps(&analysis.recommendations));
        system_analysis = Some(analysis);
    }

    if request.wants("network") {
        let samples = if request.collect_metrics {
            load_samples(&state, &user.id, &game_id, MetricType::Network).await?
        } else {
            Vec::new()
        };
        let readings: Vec<_> = samples.iter().filter_map(|s| s.network().cloned()).collect();
        let analysis = if readings.is_empty() {
            NetworkOptimizer::default_analysis()
        } else {
            NetworkOptimizer::analyze(&readings, &game_id)
        };
        steps.extend(generate_steps(&analysis.recommendations));
        network_analysis = Some(analysis);
    }

    let now = Utc::now();
    let optimization_type = request.optimization_type();
    let requires_client = steps.iter().any(|s| s.automated);
    let optimization_id = format!("opt-{}", uuid::Uuid::new_v4());

    game.mark_optimized(optimization_type, now);
    state.store.put_game(game.clone()).await.map_err(ApiError::from)?;

    let record = OptimizationRecord {
        optimization_id: optimization_id.clone(),
        game_id: game_id.clone(),
        timestamp: now,
        optimization_type: optimization_type.to_string(),
        settings: request.settings.clone(),
        steps: steps.clone(),
        system_analysis: system_analysis.clone(),
        network_analysis: network_analysis.clone(),
        requires_client,
    };
    state
        .store
        .append_optimization(&user.id, &game_id, record)
        .await
        .map_err(ApiError::from)?;

    info!(
        "⚡ Optimization {} ({}) recorded for user {} on game {}",
        optimization_id, optimization_type, user.id, game_id
    );

    let response = GameOptimizationResponse {
        success: true,
        optimization_id,
        estimated_completion_time: if requires_client { 30 } else { 5 },
        applied_settings: request.settings,
        steps,
        issues_detected: IssuesDetected {
            system: analysis_json(system_analysis.as_ref())?,
            network: analysis_json(network_analysis.as_ref())?,
        },
        requires_client,
        game,
    };
    Ok(json_reply(&response))
}

async fn ml_game_detection() -> Result<Response, Rejection> {
    Ok(json_reply(&serde_json::json!({ "detectedGames": detect_all_games() })))
}

/// Canned improvement estimate for the desktop client's one-click optimize
async fn ml_optimize_game(game_id: String) -> Result<Response, Rejection> {
    info!("🤖 Estimated optimization gains for game {}", game_id);
    Ok(json_reply(&serde_json::json!({
        "success": true,
        "gameId": game_id,
        "optimizationType": "both",
        "improvements": {
            "latency": 25,
            "fps": 15,
            "stability": 30,
        },
    })))
}

pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let list = warp::path!("api" / "games")
        .or(warp::path!("games"))
        .unify()
        .and(warp::get())
        .and(with_user(state.clone()))
        .and(with_state(state.clone()))
        .and_then(list_games);

    let detected = warp::path!("api" / "games" / "detected")
        .and(warp::get())
        .and(with_user(state.clone()))
        .and(with_state(state.clone()))
        .and_then(detected_games);

    let register = warp::path!("api" / "games" / "register")
        .and(warp::post())
        .and(with_user(state.clone()))
        .and(json_body::<GameRegistrationBatch>())
        .and(with_state(state.clone()))
        .and_then(register_games);

    let single = warp::path!("api" / "games" / String)
        .and(warp::get())
        .and_then(|game_id: String| async move {
            if RESERVED_GAME_SEGMENTS.contains(&game_id.as_str()) {
                return Err(warp::reject::not_found());
            }
            Ok(game_id)
        })
        .and(with_user(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_game);

    let optimize = warp::path!("api" / "games" / String / "optimize")
        .and(warp::post())
        .and(with_user(state.clone()))
        .and(json_body::<GameOptimizationRequest>())
        .and(with_state(state))
        .and_then(optimize_game);

    let detection = warp::path!("ml" / "game-detection")
        .and(warp::get())
        .and_then(ml_game_detection);

    let estimate = warp::path!("ml" / "optimize-game" / String)
        .and(warp::post())
        .and_then(ml_optimize_game);

    list.or(detected)
        .unify()
        .or(register)
        .unify()
        .or(single)
        .unify()
        .or(optimize)
        .unify()
        .or(detection)
        .unify()
        .or(estimate)
        .unify()
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimization_type_collapse() {
        let request = |types: &[&str]| GameOptimizationRequest {
            optimization_types: types.iter().map(|t| t.to_string()).collect(),
            settings: empty_object(),
            collect_metrics: true,
        };
        assert_eq!(request(&["network"]).optimization_type(), "network");
        assert_eq!(request(&["system"]).optimization_type(), "system");
        assert_eq!(request(&["network", "system"]).optimization_type(), "both");
        assert_eq!(request(&["both"]).optimization_type(), "both");
        assert!(request(&[]).validate().is_err());
        assert!(request(&["turbo"]).validate().is_err());
    }

    #[test]
    fn test_registration_defaults() {
        let batch: GameRegistrationBatch = serde_json::from_value(serde_json::json!([
            {"id": "valorant", "name": "Valorant", "slug": "valorant", "source": "riot"}
        ]))
        .unwrap();
        assert!(batch.validate().is_ok());
        let game = batch.0[0].clone().apply_to(None);
        assert_eq!(game.platforms, vec!["PC".to_string()]);
        assert!(game.is_detected);
        assert_eq!(game.source.as_deref(), Some("riot"));
    }

    #[test]
    fn test_registration_keeps_optimization_history_fields() {
        let mut existing = GameRegistration {
            id: "cs2".to_string(),
            name: "CS".to_string(),
            slug: "cs2".to_string(),
            source: "steam".to_string(),
            app_id: None,
            genre: None,
            publisher: None,
            release_year: None,
            platforms: default_platforms(),
            install_path: None,
            executable_path: None,
            is_detected: true,
            is_optimized: false,
            last_optimized: None,
        }
        .apply_to(None);
        existing.performance_metrics = Some(serde_json::json!({"fpsImprovement": 25}));

        let update = GameRegistration {
            name: "Counter-Strike 2".to_string(),
            ..serde_json::from_value(serde_json::json!({
                "id": "cs2", "name": "x", "slug": "cs2", "source": "steam"
            }))
            .unwrap()
        };
        let merged = update.apply_to(Some(existing));
        assert_eq!(merged.name, "Counter-Strike 2");
        assert!(merged.performance_metrics.is_some());
    }
}
