//! HTTP surface: one filter tree per resource area, joined with shared error mapping,
//! instance headers and access logging.

pub mod auth;
pub mod catalog;
pub mod filters;
pub mod games;
pub mod health;
pub mod optimizations;
pub mod predict;
pub mod telemetry;
pub mod training;
pub mod tuning;
pub mod users;

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use tracing::{info, warn};
use warp::http::header::{HeaderMap, HeaderName, HeaderValue};
use warp::{Filter, Reply};

use crate::common::constants::{API_VERSION, API_VERSION_HEADER, INSTANCE_ID_HEADER};
use crate::error::handle_rejection;
use crate::state::AppState;

fn instance_headers(instance_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let instance = HeaderValue::from_str(instance_id).unwrap_or_else(|_| {
        warn!("⚠️ Instance id {:?} is not a valid header value", instance_id);
        HeaderValue::from_static("unknown")
    });
    headers.insert(HeaderName::from_static(INSTANCE_ID_HEADER), instance);
    headers.insert(
        HeaderName::from_static(API_VERSION_HEADER),
        HeaderValue::from_static(API_VERSION),
    );
    headers
}

/// Full route tree with rejection recovery, instance headers and request accounting
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let metrics = state.metrics.clone();
    let access_log = warp::log::custom(move |info: warp::log::Info<'_>| {
        let elapsed = info.elapsed();
        metrics.record_request(info.method().as_str(), info.status().as_u16(), elapsed.as_secs_f64());
        info!(
            target: "gamepath_api::access",
            method = %info.method(),
            path = info.path(),
            status = info.status().as_u16(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "{} {} {}",
            info.method(),
            info.path(),
            info.status()
        );
    });

    let headers = instance_headers(state.instance_id());

    health::routes(state.clone())
        .or(auth::routes(state.clone()))
        .unify()
        .or(users::routes(state.clone()))
        .unify()
        .or(games::routes(state.clone()))
        .unify()
        .or(telemetry::routes(state.clone()))
        .unify()
        .or(predict::routes(state.clone()))
        .unify()
        .or(tuning::routes(state.clone()))
        .unify()
        .or(optimizations::routes(state.clone()))
        .unify()
        .or(training::routes(state))
        .unify()
        .or(catalog::routes())
        .unify()
        .recover(handle_rejection)
        .with(warp::reply::with::headers(headers))
        .with(access_log)
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<S>(state: AppState, addr: SocketAddr, shutdown: S) -> Result<(), warp::Error>
where
    S: Future<Output = ()> + Send + 'static,
{
    let (bound, server) = warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    info!("🚀 GamePath API listening on http://{}", bound);
    server.await;
    info!("🛑 HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_headers() {
        let headers = instance_headers("api-7");
        assert_eq!(headers.get("x-instance-id").unwrap(), "api-7");
        assert_eq!(headers.get("x-api-version").unwrap(), API_VERSION);

        let headers = instance_headers("bad\nvalue");
        assert_eq!(headers.get("x-instance-id").unwrap(), "unknown");
    }
}
