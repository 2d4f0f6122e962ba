//! Model refresh endpoints: drop the cached artifact and reload it from disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::filters::{json_body, json_reply, with_api_key, with_state};
use crate::engine::types::ValidationError;
use crate::engine::Validate;
use crate::error::ApiError;
use crate::models::{ModelError, ModelKind};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingRequest {
    #[serde(default)]
    pub force_retrain: bool,
}

impl Validate for TrainingRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingResponse {
    pub status: &'static str,
    pub message: String,
    pub model_name: &'static str,
    pub training_time: f64,
    /// Version of the artifact now on disk, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub timestamp: DateTime<Utc>,
}

async fn refresh(state: &AppState, kind: ModelKind, force: bool) -> Result<TrainingResponse, ModelError> {
    let started = Instant::now();
    info!("🧠 Refreshing {} model (force_retrain={})", kind, force);

    let models = state.recommender.models();
    models.evict(kind).await?;
    let artifact = models.load(kind).await?;

    Ok(TrainingResponse {
        status: "success",
        message: format!("{} model trained successfully", kind.label()),
        model_name: kind.name(),
        training_time: started.elapsed().as_secs_f64(),
        model_version: artifact.map(|a| a.version),
        timestamp: Utc::now(),
    })
}

async fn train_one(kind: ModelKind, request: TrainingRequest, state: AppState) -> Result<Response, Rejection> {
    let response = refresh(&state, kind, request.force_retrain).await.map_err(|e| {
        error!("❌ Failed to train {} model: {}", kind, e);
        match e {
            ModelError::CacheUnavailable(msg) => ApiError::UpstreamUnavailable(msg),
            #[cfg(feature = "redis")]
            ModelError::Redis(e) => ApiError::UpstreamUnavailable(e.to_string()),
            other => ApiError::OperationFailed(format!("Failed to train {} model: {}", kind.label(), other)),
        }
    })?;
    Ok(json_reply(&response))
}

async fn train_all(request: TrainingRequest, state: AppState) -> Result<Response, Rejection> {
    let mut results = Vec::with_capacity(ModelKind::ALL.len());
    for kind in ModelKind::ALL {
        let result = match refresh(&state, kind, request.force_retrain).await {
            Ok(response) => response,
            Err(e) => {
                error!("❌ Failed to train {} model: {}", kind, e);
                TrainingResponse {
                    status: "error",
                    message: format!("Failed to train {} model: {}", kind.label(), e),
                    model_name: kind.name(),
                    training_time: 0.0,
                    model_version: None,
                    timestamp: Utc::now(),
                }
            }
        };
        results.push(result);
    }
    Ok(json_reply(&results))
}

fn train_route(state: AppState, segment: &'static str, kind: ModelKind) -> BoxedFilter<(Response,)> {
    warp::path("api")
        .and(warp::path("train"))
        .and(warp::path(segment))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_api_key(state.clone()))
        .map(move || kind)
        .and(json_body::<TrainingRequest>())
        .and(with_state(state))
        .and_then(train_one)
        .boxed()
}

pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let all = warp::path!("api" / "train" / "all")
        .and(warp::post())
        .and(with_api_key(state.clone()))
        .and(json_body::<TrainingRequest>())
        .and(with_state(state.clone()))
        .and_then(train_all);

    train_route(state.clone(), "network", ModelKind::Network)
        .or(train_route(state.clone(), "system", ModelKind::System))
        .unify()
        .or(train_route(state, "server-recommender", ModelKind::ServerRecommender))
        .unify()
        .or(all)
        .unify()
        .boxed()
}
