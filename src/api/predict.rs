//! API-key protected recommendation endpoints backed by the recommendation service.

use chrono::Utc;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::filters::{json_body, json_reply, with_api_key, with_state};
use crate::common::constants::{NETWORK_MODEL_NAME, SERVER_MODEL_NAME, SYSTEM_MODEL_NAME};
use crate::engine::types::{
    GamingOptimizationRequest, NetworkOptimizationRequest, NetworkOptimizationResponse, ServerRecommendation,
    ServerRecommendationRequest, ServerRecommendationResponse, SystemOptimizationRequest, SystemOptimizationResponse,
};
use crate::error::ApiError;
use crate::metrics::ServiceMetrics;
use crate::state::AppState;

fn record_servers(metrics: &ServiceMetrics, ranked: &[ServerRecommendation]) {
    if let Some(first) = ranked.first() {
        metrics.record_recommendation(SERVER_MODEL_NAME, first.is_fallback);
    }
}

async fn optimize_network(request: NetworkOptimizationRequest, state: AppState) -> Result<Response, Rejection> {
    let recommendations = state
        .recommender
        .optimize_network(&request.network_data)
        .await
        .map_err(ApiError::from)?;
    state
        .metrics
        .record_recommendation(NETWORK_MODEL_NAME, recommendations.provenance.is_fallback);
    Ok(json_reply(&NetworkOptimizationResponse {
        recommendations,
        timestamp: Utc::now(),
    }))
}

async fn optimize_system(request: SystemOptimizationRequest, state: AppState) -> Result<Response, Rejection> {
    let recommendations = state
        .recommender
        .optimize_system(&request.system_data)
        .await
        .map_err(ApiError::from)?;
    state
        .metrics
        .record_recommendation(SYSTEM_MODEL_NAME, recommendations.provenance.is_fallback);
    Ok(json_reply(&SystemOptimizationResponse {
        recommendations,
        timestamp: Utc::now(),
    }))
}

async fn recommend_servers(request: ServerRecommendationRequest, state: AppState) -> Result<Response, Rejection> {
    let recommendations = state
        .recommender
        .recommend_servers(&request.servers)
        .await
        .map_err(ApiError::from)?;
    record_servers(&state.metrics, &recommendations);
    Ok(json_reply(&ServerRecommendationResponse {
        recommendations,
        timestamp: Utc::now(),
    }))
}

async fn optimize_gaming(request: GamingOptimizationRequest, state: AppState) -> Result<Response, Rejection> {
    let response = state.recommender.optimize_gaming(&request).await.map_err(ApiError::from)?;

    if let Some(network) = &response.network_recommendations {
        state
            .metrics
            .record_recommendation(NETWORK_MODEL_NAME, network.provenance.is_fallback);
    }
    if let Some(system) = &response.system_recommendations {
        state
            .metrics
            .record_recommendation(SYSTEM_MODEL_NAME, system.provenance.is_fallback);
    }
    if let Some(servers) = &response.server_recommendations {
        record_servers(&state.metrics, servers);
    }
    Ok(json_reply(&response))
}

pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let network = warp::path!("api" / "optimize-network")
        .and(warp::post())
        .and(with_api_key(state.clone()))
        .and(json_body::<NetworkOptimizationRequest>())
        .and(with_state(state.clone()))
        .and_then(optimize_network);

    let system = warp::path!("api" / "optimize-system")
        .and(warp::post())
        .and(with_api_key(state.clone()))
        .and(json_body::<SystemOptimizationRequest>())
        .and(with_state(state.clone()))
        .and_then(optimize_system);

    let servers = warp::path!("api" / "recommend-servers")
        .and(warp::post())
        .and(with_api_key(state.clone()))
        .and(json_body::<ServerRecommendationRequest>())
        .and(with_state(state.clone()))
        .and_then(recommend_servers);

    let gaming = warp::path!("api" / "optimize-gaming")
        .and(warp::post())
        .and(with_api_key(state.clone()))
        .and(json_body::<GamingOptimizationRequest>())
        .and(with_state(state))
        .and_then(optimize_gaming);

    network
        .or(system)
        .unify()
        .or(servers)
        .unify()
        .or(gaming)
        .unify()
        .boxed()
}
