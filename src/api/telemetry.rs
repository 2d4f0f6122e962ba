//! Live metric readouts and the per-user telemetry sample log.

use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::filters::{json_body, json_reply, json_reply_with_status, with_state, with_user};
use crate::common::constants::DEFAULT_METRICS_LIMIT;
use crate::engine::types::{non_negative, percentage, ValidationError};
use crate::engine::Validate;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{MetricData, MetricQuery, MetricSample, MetricType, User};

const DEFAULT_QUERY_HOURS: i64 = 24;
const MAX_QUERY_HOURS: i64 = 24 * 365;
const MAX_QUERY_LIMIT: usize = 1000;

/// Query window ending now; rejects windows outside one hour to one year
fn lookback_window(hours: Option<i64>) -> Result<Duration, ApiError> {
    let hours = hours.unwrap_or(DEFAULT_QUERY_HOURS);
    if !(1..=MAX_QUERY_HOURS).contains(&hours) {
        return Err(ApiError::Validation(format!(
            "hours must be between 1 and {}",
            MAX_QUERY_HOURS
        )));
    }
    Ok(Duration::hours(hours))
}

/// Telemetry sample as submitted by a client
#[derive(Debug, Clone, Deserialize)]
pub struct MetricSubmission {
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(flatten)]
    pub data: MetricData,
}

impl Validate for MetricSubmission {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.data {
            MetricData::System(reading) => {
                percentage("cpu_usage", reading.cpu_usage)?;
                percentage("gpu_usage", reading.gpu_usage)?;
                percentage("ram_usage", reading.ram_usage)?;
                non_negative("fps", reading.fps)?;
                non_negative("temperature", reading.temperature)
            }
            MetricData::Network(reading) => {
                non_negative("ping", reading.ping)?;
                non_negative("jitter", reading.jitter)?;
                non_negative("packet_loss", reading.packet_loss)?;
                non_negative("download_speed", reading.download_speed)?;
                non_negative("upload_speed", reading.upload_speed)
            }
            MetricData::Event(_) => Err(ValidationError::new(
                "metric_type",
                "Event samples are recorded by the service only",
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SampleQuery {
    #[serde(rename = "type", default)]
    metric_type: Option<String>,
    #[serde(default)]
    hours: Option<i64>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn ping() -> Result<Response, Rejection> {
    Ok(json_reply(&json!({ "value": 35, "unit": "ms", "timestamp": Utc::now() })))
}

async fn jitter() -> Result<Response, Rejection> {
    Ok(json_reply(&json!({ "value": 5, "unit": "ms", "timestamp": Utc::now() })))
}

async fn system() -> Result<Response, Rejection> {
    Ok(json_reply(&json!({ "cpu": 45, "memory": 60, "gpu": 50, "timestamp": Utc::now() })))
}

async fn submit_sample(user: User, submission: MetricSubmission, state: AppState) -> Result<Response, Rejection> {
    let sample = MetricSample::new(&user.id, submission.game_id, submission.data);
    state.store.store_metric(sample.clone()).await.map_err(ApiError::from)?;
    debug!("📈 Stored metric {} for user {}", sample.id, user.id);
    Ok(json_reply_with_status(&sample, StatusCode::CREATED))
}

async fn query_samples(user: User, query: SampleQuery, state: AppState) -> Result<Response, Rejection> {
    let metric_type = query
        .metric_type
        .as_deref()
        .map(str::parse::<MetricType>)
        .transpose()
        .map_err(ApiError::Validation)?;
    let window = lookback_window(query.hours)?;
    let limit = query.limit.unwrap_or(DEFAULT_METRICS_LIMIT).min(MAX_QUERY_LIMIT);

    let end = Utc::now();
    let start = end - window;
    let samples = state
        .store
        .query_metrics(&user.id, MetricQuery::new(start, end, limit).of_type(metric_type))
        .await
        .map_err(ApiError::from)?;
    Ok(json_reply(&json!({ "metrics": samples, "count": samples.len() })))
}

pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let ping_route = warp::path!("api" / "metrics" / "ping").and(warp::get()).and_then(ping);
    let jitter_route = warp::path!("api" / "metrics" / "jitter").and(warp::get()).and_then(jitter);
    let system_route = warp::path!("api" / "metrics" / "system").and(warp::get()).and_then(system);

    let submit_route = warp::path!("api" / "metrics" / "samples")
        .and(warp::post())
        .and(with_user(state.clone()))
        .and(json_body::<MetricSubmission>())
        .and(with_state(state.clone()))
        .and_then(submit_sample);

    let query_route = warp::path!("api" / "metrics" / "samples")
        .and(warp::get())
        .and(with_user(state.clone()))
        .and(warp::query::<SampleQuery>())
        .and(with_state(state))
        .and_then(query_samples);

    ping_route
        .or(jitter_route)
        .unify()
        .or(system_route)
        .unify()
        .or(submit_route)
        .unify()
        .or(query_route)
        .unify()
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_parses_tagged_payload() {
        let submission: MetricSubmission = serde_json::from_value(json!({
            "metric_type": "system",
            "game_id": "valorant",
            "cpu_usage": 55.0, "gpu_usage": 70.0, "ram_usage": 40.0,
            "fps": 144.0, "temperature": 66.0
        }))
        .unwrap();
        assert!(submission.validate().is_ok());
        assert_eq!(submission.game_id.as_deref(), Some("valorant"));
    }

    #[test]
    fn test_submission_rejects_out_of_range_usage() {
        let submission: MetricSubmission = serde_json::from_value(json!({
            "metric_type": "system",
            "cpu_usage": 150.0, "gpu_usage": 70.0, "ram_usage": 40.0,
            "fps": 144.0, "temperature": 66.0
        }))
        .unwrap();
        assert_eq!(submission.validate().unwrap_err().field, "cpu_usage");
    }

    #[test]
    fn test_lookback_window_bounds() {
        assert_eq!(lookback_window(None).unwrap(), Duration::hours(24));
        assert_eq!(lookback_window(Some(MAX_QUERY_HOURS)).unwrap(), Duration::hours(MAX_QUERY_HOURS));
        assert!(matches!(lookback_window(Some(0)), Err(ApiError::Validation(_))));
        assert!(matches!(lookback_window(Some(-5)), Err(ApiError::Validation(_))));
        assert!(matches!(lookback_window(Some(i64::MAX)), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_client_events_rejected() {
        let submission: MetricSubmission = serde_json::from_value(json!({
            "metric_type": "event",
            "name": "server_recommendation"
        }))
        .unwrap();
        assert!(submission.validate().is_err());
    }
}
