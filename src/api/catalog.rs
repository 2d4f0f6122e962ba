//! Static VPN, subscription and optimizer status endpoints, plus desktop client commands.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::filters::{json_reply, with_client};
use crate::auth::ClientIdentity;

#[derive(Debug, Clone, Serialize)]
pub struct VpnServer {
    pub id: &'static str,
    pub location: &'static str,
    pub ping: u32,
}

pub const VPN_SERVERS: [VpnServer; 3] = [
    VpnServer { id: "us-east", location: "New York", ping: 30 },
    VpnServer { id: "eu-west", location: "London", ping: 80 },
    VpnServer { id: "asia-east", location: "Tokyo", ping: 150 },
];

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub tier: &'static str,
    pub price: f64,
    pub features: &'static [&'static str],
}

pub const PLANS: [Plan; 3] = [
    Plan { tier: "free", price: 0.0, features: &["Basic optimization"] },
    Plan { tier: "player", price: 9.99, features: &["Advanced optimization", "VPN access"] },
    Plan { tier: "alliance", price: 19.99, features: &["All features", "Priority support"] },
];

async fn vpn_status() -> Result<Response, Rejection> {
    Ok(json_reply(&json!({ "connected": false, "available": true })))
}

async fn vpn_servers() -> Result<Response, Rejection> {
    Ok(json_reply(&json!({ "servers": VPN_SERVERS })))
}

async fn subscription_plans() -> Result<Response, Rejection> {
    Ok(json_reply(&json!({ "plans": PLANS })))
}

async fn subscription_status() -> Result<Response, Rejection> {
    Ok(json_reply(&json!({
        "active": true,
        "tier": "free",
        "expires_at": "2025-06-05T00:00:00Z",
    })))
}

async fn optimizer_status() -> Result<Response, Rejection> {
    Ok(json_reply(&json!({ "status": "active", "optimizations_available": true })))
}

async fn detect_games(client: ClientIdentity) -> Result<Response, Rejection> {
    let command_id = format!("cmd-{}", uuid::Uuid::new_v4());
    info!(
        "🖥️ Queued game detection command {} for client {} at {}",
        command_id,
        client.id,
        Utc::now().to_rfc3339()
    );
    Ok(json_reply(&json!({
        "success": true,
        "command_id": command_id,
        "message": "Game detection initiated on client",
    })))
}

pub fn routes() -> BoxedFilter<(Response,)> {
    let vpn_status_route = warp::path!("api" / "vpn" / "status").and(warp::get()).and_then(vpn_status);
    let vpn_servers_route = warp::path!("api" / "vpn" / "servers").and(warp::get()).and_then(vpn_servers);
    let plans_route = warp::path!("api" / "subscription" / "plans")
        .and(warp::get())
        .and_then(subscription_plans);
    let subscription_route = warp::path!("api" / "subscription" / "status")
        .and(warp::get())
        .and_then(subscription_status);
    let opt_status_route = warp::path!("api" / "opt" / "status").and(warp::get()).and_then(optimizer_status);

    let detect_route = warp::path!("api" / "client" / "detect-games")
        .and(warp::post())
        .and(with_client())
        .and_then(detect_games);

    vpn_status_route
        .or(vpn_servers_route)
        .unify()
        .or(plans_route)
        .unify()
        .or(subscription_route)
        .unify()
        .or(opt_status_route)
        .unify()
        .or(detect_route)
        .unify()
        .boxed()
}
