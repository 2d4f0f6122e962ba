//! Load-balancer health check and service counters.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use tracing::{error, info};
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use super::filters::{json_reply, json_reply_with_status, with_api_key, with_state};
use crate::common::constants::{API_VERSION, SERVICE_NAME};
use crate::error::ApiError;
use crate::state::AppState;

async fn health(state: AppState) -> Result<Response, Rejection> {
    let started = Instant::now();
    match state.store.ping().await {
        Ok(game_count) => {
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            let models = state.recommender.models();
            let cache = models.cache_status().await;
            info!("🏥 Health check passed ({} games, {:.2}ms)", game_count, elapsed_ms);
            Ok(json_reply(&json!({
                "status": "healthy",
                "instance_id": state.instance_id(),
                "environment": state.config.server.environment,
                "database": "connected",
                "database_response_time_ms": (elapsed_ms * 100.0).round() / 100.0,
                "cache": cache,
                "cache_backend": models.cache_backend(),
                "api_version": API_VERSION,
                "timestamp": Utc::now(),
            })))
        }
        Err(e) => {
            error!("❌ Health check failed: {}", e);
            Ok(json_reply_with_status(
                &json!({
                    "status": "unhealthy",
                    "instance_id": state.instance_id(),
                    "database": "disconnected",
                    "error": e.to_string(),
                    "timestamp": Utc::now(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetricsQuery {
    #[serde(default)]
    format: Option<String>,
}

async fn service_metrics(query: MetricsQuery, state: AppState) -> Result<Response, Rejection> {
    if query.format.as_deref() == Some("prometheus") {
        let text = state.metrics.render().map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok(warp::reply::with_header(text, "content-type", "text/plain; version=0.0.4").into_response());
    }

    let snapshot = state.metrics.snapshot();
    Ok(json_reply(&json!({
        "service": SERVICE_NAME,
        "instance_id": state.instance_id(),
        "uptime": format!("{}s", snapshot.uptime_seconds),
        "uptime_seconds": snapshot.uptime_seconds,
        "requests_processed": snapshot.requests_processed,
        "request_errors": snapshot.request_errors,
        "success_rate": format!("{:.1}%", snapshot.success_rate),
        "average_response_time": format!("{:.0}ms", snapshot.average_response_time_ms),
        "environment": state.config.server.environment,
        "timestamp": Utc::now(),
    })))
}

pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let health_route = warp::path!("health")
        .or(warp::path!("api" / "health"))
        .unify()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(health);

    let metrics_route = warp::path!("metrics")
        .and(warp::get())
        .and(with_api_key(state.clone()))
        .and(warp::query::<MetricsQuery>())
        .and(with_state(state))
        .and_then(service_metrics);

    health_route.or(metrics_route).unify().boxed()
}
