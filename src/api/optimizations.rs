//! Optimization catalog, application and history for signed-in users.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::filters::{json_body, json_reply, with_state, with_user};
use super::games::empty_object;
use crate::common::constants::HISTORY_LIMIT;
use crate::engine::types::ValidationError;
use crate::engine::Validate;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{EventPayload, MetricData, MetricSample, OptimizationRecord, SubscriptionTier, User};

const KNOWN_OPTIMIZATIONS: [&str; 5] = ["network", "system", "resources", "thermal", "both"];

#[derive(Debug, Clone, Serialize)]
pub struct AvailableOptimization {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub availability: &'static str,
}

/// Catalog entries visible to a subscription tier
pub fn available_for(tier: SubscriptionTier) -> Vec<AvailableOptimization> {
    let mut optimizations = vec![
        AvailableOptimization {
            id: "network",
            name: "Network Optimization",
            description: "Optimizes network settings for online games",
            availability: "all",
        },
        AvailableOptimization {
            id: "system",
            name: "System Optimization",
            description: "Optimizes system settings for better performance",
            availability: "all",
        },
    ];
    if tier != SubscriptionTier::Free {
        optimizations.push(AvailableOptimization {
            id: "resources",
            name: "Resource Management",
            description: "Manages system resources during gameplay",
            availability: "premium",
        });
        optimizations.push(AvailableOptimization {
            id: "thermal",
            name: "Thermal Management",
            description: "Controls temperature during gameplay",
            availability: "premium",
        });
    }
    optimizations
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyRequest {
    pub optimization_types: Vec<String>,
    #[serde(default = "empty_object")]
    pub settings: serde_json::Value,
    pub game_id: String,
}

impl Validate for ApplyRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.game_id.trim().is_empty() {
            return Err(ValidationError::new("game_id", "Field must not be empty"));
        }
        if self.optimization_types.is_empty() {
            return Err(ValidationError::new("optimization_types", "At least one optimization type is required"));
        }
        match self
            .optimization_types
            .iter()
            .find(|t| !KNOWN_OPTIMIZATIONS.contains(&t.as_str()))
        {
            Some(unknown) => Err(ValidationError::new(
                "optimization_types",
                &format!("Unknown optimization type: {}", unknown),
            )),
            None => Ok(()),
        }
    }
}

async fn available(user: User) -> Result<Response, Rejection> {
    Ok(json_reply(&json!({
        "optimizations": available_for(user.tier),
        "user_tier": user.tier.as_str(),
    })))
}

async fn apply(user: User, request: ApplyRequest, state: AppState) -> Result<Response, Rejection> {
    let mut game = state
        .store
        .get_game(&request.game_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Game"))?;

    let now = Utc::now();
    let optimization_type = request.optimization_types.join(",");
    let optimization_id = format!("opt-{}", uuid::Uuid::new_v4());

    state
        .store
        .store_metric_detached(MetricSample::new(
            &user.id,
            Some(request.game_id.clone()),
            MetricData::Event(EventPayload {
                name: "optimizations_apply".to_string(),
                details: json!({
                    "optimization_types": request.optimization_types,
                    "settings": request.settings,
                }),
            }),
        ))
        .await;

    game.mark_optimized(&optimization_type, now);
    state.store.put_game(game).await.map_err(ApiError::from)?;

    let record = OptimizationRecord {
        optimization_id: optimization_id.clone(),
        game_id: request.game_id.clone(),
        timestamp: now,
        optimization_type: optimization_type.clone(),
        settings: request.settings.clone(),
        steps: Vec::new(),
        system_analysis: None,
        network_analysis: None,
        requires_client: true,
    };
    state
        .store
        .append_optimization(&user.id, &request.game_id, record)
        .await
        .map_err(ApiError::from)?;

    info!("⚡ Applied {} to game {} for user {}", optimization_type, request.game_id, user.id);
    Ok(json_reply(&json!({
        "success": true,
        "optimizationId": optimization_id,
        "estimatedCompletionTime": 30,
        "appliedSettings": request.settings,
    })))
}

async fn user_optimizations(state: &AppState, user_id: &str) -> Result<Vec<OptimizationRecord>, ApiError> {
    let relations = state.store.get_user_games(user_id).await?;
    let mut records: Vec<OptimizationRecord> = relations.into_iter().flat_map(|r| r.optimizations).collect();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(records)
}

async fn status(optimization_id: String, user: User, state: AppState) -> Result<Response, Rejection> {
    let record = user_optimizations(&state, &user.id)
        .await?
        .into_iter()
        .find(|r| r.optimization_id == optimization_id)
        .ok_or_else(|| ApiError::not_found("Optimization"))?;

    Ok(json_reply(&json!({
        "status": "completed",
        "progress": 100,
        "optimizationId": record.optimization_id,
        "gameId": record.game_id,
        "completedAt": record.timestamp,
        "results": {
            "performanceImprovement": "15%",
            "networkLatencyReduction": "30ms",
        },
    })))
}

async fn history(user: User, state: AppState) -> Result<Response, Rejection> {
    let records = user_optimizations(&state, &user.id).await?;

    let mut optimizations = Vec::with_capacity(HISTORY_LIMIT);
    for record in records.into_iter().take(HISTORY_LIMIT) {
        let game_name = state
            .store
            .get_game(&record.game_id)
            .await
            .map_err(ApiError::from)?
            .map(|g| g.name)
            .unwrap_or_else(|| "Unknown Game".to_string());
        let types: Vec<&str> = record.optimization_type.split(',').collect();
        optimizations.push(json!({
            "id": record.optimization_id,
            "gameId": record.game_id,
            "gameName": game_name,
            "timestamp": record.timestamp,
            "status": "completed",
            "types": types,
            "results": {
                "performanceImprovement": "10%",
                "networkLatencyReduction": "25ms",
            },
        }));
    }

    Ok(json_reply(&json!({ "optimizations": optimizations })))
}

pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let available_route = warp::path!("api" / "optimizations" / "available")
        .and(warp::get())
        .and(with_user(state.clone()))
        .and_then(available);

    let apply_route = warp::path!("api" / "optimizations" / "apply")
        .and(warp::post())
        .and(with_user(state.clone()))
        .and(json_body::<ApplyRequest>())
        .and(with_state(state.clone()))
        .and_then(apply);

    let status_route = warp::path!("api" / "optimizations" / "status" / String)
        .and(warp::get())
        .and(with_user(state.clone()))
        .and(with_state(state.clone()))
        .and_then(status);

    let history_route = warp::path!("api" / "optimizations" / "history")
        .and(warp::get())
        .and(with_user(state.clone()))
        .and(with_state(state))
        .and_then(history);

    available_route
        .or(apply_route)
        .unify()
        .or(status_route)
        .unify()
        .or(history_route)
        .unify()
        .boxed()
}
