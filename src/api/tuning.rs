//! Simulated server lookup and static system/network tuning bundles for signed-in users.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Rejection};

use super::filters::{json_reply, with_state, with_user};
use crate::state::AppState;
use crate::store::{EventPayload, MetricData, MetricSample, User};

const SERVER_REGIONS: [&str; 8] = [
    "us-east",
    "us-west",
    "eu-west",
    "eu-central",
    "asia-east",
    "asia-southeast",
    "south-america",
    "australia",
];
const MAX_SIMULATED_SERVERS: u32 = 10;
const NEAR_REGION_LATENCY_MS: u32 = 30;
const FAR_REGION_LATENCY_MS: u32 = 70;
const LATENCY_SPREAD_MS: u32 = 40;
const SERVER_CAPACITY: u32 = 500;

fn default_max_latency() -> u32 {
    100
}

fn default_max_results() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
struct ServerQuery {
    game_id: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default = "default_max_latency")]
    max_latency: u32,
    #[serde(default = "default_max_results")]
    max_results: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulatedServer {
    pub server_id: String,
    pub name: String,
    pub region: String,
    pub estimated_latency: u32,
    pub player_count: u32,
    pub max_players: u32,
    pub reliability_score: f64,
}

/// Regions whose name contains the filter come first, the rest keep their order
fn prioritized_regions(region: Option<&str>) -> Vec<&'static str> {
    match region {
        Some(filter) => {
            let (mut near, far): (Vec<_>, Vec<_>) = SERVER_REGIONS.iter().copied().partition(|r| r.contains(filter));
            near.extend(far);
            near
        }
        None => SERVER_REGIONS.to_vec(),
    }
}

fn simulate_servers<R: Rng>(rng: &mut R, query: &ServerQuery) -> Vec<SimulatedServer> {
    let regions = prioritized_regions(query.region.as_deref());
    let count = query.max_results.min(MAX_SIMULATED_SERVERS) as usize;

    (0..count)
        .filter_map(|i| {
            let region = regions[i % regions.len()];
            let near = query.region.as_deref().is_some_and(|filter| region.contains(filter));
            let base = if near { NEAR_REGION_LATENCY_MS } else { FAR_REGION_LATENCY_MS };
            let latency = base + rng.gen_range(0..=LATENCY_SPREAD_MS);
            if latency > query.max_latency {
                return None;
            }
            Some(SimulatedServer {
                server_id: format!("srv-{}-{}-{}", query.game_id, region, i + 1),
                name: format!("{} Server {}", query.game_id.to_uppercase(), i + 1),
                region: region.to_string(),
                estimated_latency: latency,
                player_count: rng.gen_range(10..=SERVER_CAPACITY),
                max_players: SERVER_CAPACITY,
                reliability_score: (rng.gen_range(4.0..=5.0_f64) * 10.0).round() / 10.0,
            })
        })
        .collect()
}

fn event(user: &User, game_id: Option<String>, name: &str, details: serde_json::Value) -> MetricSample {
    MetricSample::new(
        &user.id,
        game_id,
        MetricData::Event(EventPayload {
            name: name.to_string(),
            details,
        }),
    )
}

async fn recommend_servers(user: User, query: ServerQuery, state: AppState) -> Result<Response, Rejection> {
    let servers = simulate_servers(&mut rand::thread_rng(), &query);

    state
        .store
        .store_metric_detached(event(
            &user,
            Some(query.game_id.clone()),
            "server_recommendation",
            json!({
                "region_filter": query.region,
                "max_latency": query.max_latency,
                "result_count": servers.len(),
            }),
        ))
        .await;

    info!("🛰️ Recommended {} servers for {} to user {}", servers.len(), query.game_id, user.id);
    Ok(json_reply(&json!({
        "game_id": query.game_id,
        "region_filter": query.region,
        "max_latency": query.max_latency,
        "total_results": servers.len(),
        "recommended_servers": servers,
        "timestamp": Utc::now(),
    })))
}

fn default_true() -> bool {
    true
}

fn default_cpu_priority() -> u8 {
    3
}

fn default_memory_limit() -> u8 {
    80
}

#[derive(Debug, Deserialize)]
struct SystemTuningQuery {
    #[serde(default)]
    game_id: Option<String>,
    #[serde(default = "default_true")]
    prioritize_performance: bool,
    #[serde(default = "default_cpu_priority")]
    cpu_priority: u8,
    #[serde(default = "default_memory_limit")]
    memory_usage_limit: u8,
    #[serde(default = "default_true")]
    auto_resource_management: bool,
}

fn system_bundle(query: &SystemTuningQuery) -> serde_json::Value {
    json!({
        "success": true,
        "optimized_settings": {
            "cpu_settings": {
                "power_plan": if query.prioritize_performance { "High Performance" } else { "Balanced" },
                "priority_boost": query.cpu_priority > 3,
                "process_priority": query.cpu_priority,
            },
            "memory_settings": {
                "max_usage_percent": query.memory_usage_limit,
                "page_file_optimization": true,
                "standby_list_optimization": true,
            },
            "system_services": {
                "disabled_services": ["superfetch", "windows_search", "print_spooler"],
                "delayed_services": ["windows_update"],
            },
            "auto_management": query.auto_resource_management,
        },
        "expected_improvements": {
            "fps_increase": "10-20%",
            "stuttering_reduction": "30-40%",
            "loading_time_reduction": "15-25%",
        },
        "game_specific": query.game_id.is_some(),
        "game_id": query.game_id,
        "timestamp": Utc::now(),
    })
}

async fn tune_system(user: User, query: SystemTuningQuery, state: AppState) -> Result<Response, Rejection> {
    state
        .store
        .store_metric_detached(event(
            &user,
            query.game_id.clone(),
            "system_optimization",
            json!({
                "prioritize_performance": query.prioritize_performance,
                "cpu_priority": query.cpu_priority,
                "memory_usage_limit": query.memory_usage_limit,
            }),
        ))
        .await;
    Ok(json_reply(&system_bundle(&query)))
}

fn default_latency_threshold() -> u32 {
    100
}

fn default_packet_loss_threshold() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
struct NetworkTuningQuery {
    #[serde(default)]
    game_id: Option<String>,
    #[serde(default = "default_latency_threshold")]
    latency_threshold: u32,
    #[serde(default = "default_packet_loss_threshold")]
    packet_loss_threshold: f64,
}

async fn tune_network(user: User, query: NetworkTuningQuery, state: AppState) -> Result<Response, Rejection> {
    state
        .store
        .store_metric_detached(event(
            &user,
            query.game_id.clone(),
            "network_optimization",
            json!({
                "latency_threshold": query.latency_threshold,
                "packet_loss_threshold": query.packet_loss_threshold,
            }),
        ))
        .await;

    Ok(json_reply(&json!({
        "success": true,
        "optimized_settings": {
            "tcp_nodelay": true,
            "buffer_size": 65536,
            "qos_enabled": true,
            "priority_traffic": true,
        },
        "expected_improvements": {
            "latency_reduction": "15-25%",
            "packet_loss_reduction": "30-40%",
            "jitter_reduction": "20-30%",
        },
        "game_specific": query.game_id.is_some(),
        "game_id": query.game_id,
        "timestamp": Utc::now(),
    })))
}

pub fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let servers = warp::path!("api" / "server" / "recommend")
        .and(warp::get())
        .and(with_user(state.clone()))
        .and(warp::query::<ServerQuery>())
        .and(with_state(state.clone()))
        .and_then(recommend_servers);

    let system = warp::path!("api" / "system" / "optimize")
        .and(warp::get())
        .and(with_user(state.clone()))
        .and(warp::query::<SystemTuningQuery>())
        .and(with_state(state.clone()))
        .and_then(tune_system);

    let network = warp::path!("api" / "network" / "optimize")
        .and(warp::get())
        .and(with_user(state.clone()))
        .and(warp::query::<NetworkTuningQuery>())
        .and(with_state(state))
        .and_then(tune_network);

    servers.or(system).unify().or(network).unify().boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn query(region: Option<&str>, max_latency: u32, max_results: u32) -> ServerQuery {
        ServerQuery {
            game_id: "valorant".to_string(),
            region: region.map(str::to_string),
            max_latency,
            max_results,
        }
    }

    #[test]
    fn test_requested_region_first() {
        let regions = prioritized_regions(Some("eu"));
        assert_eq!(&regions[..2], &["eu-west", "eu-central"]);
        assert_eq!(regions.len(), SERVER_REGIONS.len());
        assert_eq!(prioritized_regions(None)[0], "us-east");
    }

    #[test]
    fn test_servers_respect_latency_cap() {
        let mut rng = StdRng::seed_from_u64(7);
        let servers = simulate_servers(&mut rng, &query(Some("eu"), 60, 10));
        assert!(servers.iter().all(|s| s.estimated_latency <= 60));
        assert!(servers.iter().all(|s| s.region.starts_with("eu")));
    }

    #[test]
    fn test_server_count_capped_at_ten() {
        let mut rng = StdRng::seed_from_u64(1);
        let servers = simulate_servers(&mut rng, &query(None, 1000, 50));
        assert_eq!(servers.len(), 10);
        assert_eq!(servers[0].server_id, "srv-valorant-us-east-1");
        assert_eq!(servers[0].name, "VALORANT Server 1");
        assert!(servers.iter().all(|s| (4.0..=5.0).contains(&s.reliability_score)));
    }

    #[test]
    fn test_system_bundle_priority_boost() {
        let mut q = SystemTuningQuery {
            game_id: None,
            prioritize_performance: false,
            cpu_priority: 4,
            memory_usage_limit: 70,
            auto_resource_management: true,
        };
        let bundle = system_bundle(&q);
        assert_eq!(bundle["optimized_settings"]["cpu_settings"]["power_plan"], "Balanced");
        assert_eq!(bundle["optimized_settings"]["cpu_settings"]["priority_boost"], true);
        assert_eq!(bundle["game_specific"], false);

        q.cpu_priority = 3;
        q.game_id = Some("cs2".to_string());
        let bundle = system_bundle(&q);
        assert_eq!(bundle["optimized_settings"]["cpu_settings"]["priority_boost"], false);
        assert_eq!(bundle["game_specific"], true);
    }
}
