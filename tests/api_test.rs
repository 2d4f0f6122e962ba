use chrono::{Duration, Utc};
use serde_json::{json, Value};
use warp::http::StatusCode;

use gamepath_api::api;
use gamepath_api::auth::password::hash_password;
use gamepath_api::store::ResetToken;

mod fixtures;
use fixtures::{create_test_app, create_test_user, TestApp, TEST_API_KEY, TEST_INSTANCE_ID};

fn body_json(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
    serde_json::from_slice(response.body()).expect("Response body is not JSON")
}

async fn post_with_key(app: &TestApp, path: &str, body: &Value) -> warp::http::Response<warp::hyper::body::Bytes> {
    warp::test::request()
        .method("POST")
        .path(path)
        .header("x-api-key", TEST_API_KEY)
        .json(body)
        .reply(&api::routes(app.state.clone()))
        .await
}

#[tokio::test]
async fn test_health_reports_store_and_instance() {
    let app = create_test_app();
    let response = warp::test::request()
        .path("/health")
        .reply(&api::routes(app.state.clone()))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-instance-id"], TEST_INSTANCE_ID);
    assert!(response.headers().contains_key("x-api-version"));

    let body = body_json(&response);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["cache"], "memory");
}

#[tokio::test]
async fn test_degraded_network_uses_fallback_rules() {
    let app = create_test_app();
    let response = post_with_key(
        &app,
        "/api/optimize-network",
        &json!({ "network_data": { "ping": 150, "jitter": 25, "packet_loss": 3 } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let rec = &body_json(&response)["recommendations"];
    assert_eq!(rec["dns_settings"], "Cloudflare DNS (1.1.1.1, 1.0.0.1)");
    assert_eq!(rec["protocol"], "TCP");
    assert_eq!(rec["qos_enabled"], true);
    assert_eq!(rec["qos_priority"], "gaming");
    assert_eq!(rec["is_fallback"], true);
}

#[tokio::test]
async fn test_healthy_network_keeps_defaults() {
    let app = create_test_app();
    let response = post_with_key(
        &app,
        "/api/optimize-network",
        &json!({ "network_data": { "ping": 20, "jitter": 2, "packet_loss": 0 } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let rec = &body_json(&response)["recommendations"];
    assert_eq!(rec["dns_settings"], "Default DNS");
    assert_eq!(rec["protocol"], "Auto");
    assert_eq!(rec["qos_enabled"], false);
    assert_eq!(rec["qos_priority"], "balanced");
}

#[tokio::test]
async fn test_servers_ranked_by_ping() {
    let app = create_test_app();
    let response = post_with_key(
        &app,
        "/api/recommend-servers",
        &json!({ "servers": [
            { "server_id": 1, "name": "far", "ping": 80, "jitter": 5, "packet_loss": 1 },
            { "server_id": 2, "name": "near", "ping": 30, "jitter": 2, "packet_loss": 0 },
            { "server_id": 3, "name": "mid", "ping": 50, "jitter": 3, "packet_loss": 0.5 }
        ] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let ranked = body_json(&response)["recommendations"].as_array().unwrap().clone();
    let order: Vec<(i64, i64)> = ranked
        .iter()
        .map(|r| (r["server_id"].as_i64().unwrap(), r["rank"].as_i64().unwrap()))
        .collect();
    assert_eq!(order, vec![(2, 1), (3, 2), (1, 3)]);
}

#[tokio::test]
async fn test_out_of_range_system_input_rejected() {
    let app = create_test_app();
    let response = post_with_key(
        &app,
        "/api/optimize-system",
        &json!({ "system_data": {
            "cpu_usage": 150, "gpu_usage": 50, "ram_usage": 50, "fps": 60, "temperature": 70
        } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(&response)["detail"].as_str().unwrap().contains("cpu_usage"));
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = create_test_app();
    let response = warp::test::request()
        .method("POST")
        .path("/api/optimize-network")
        .header("x-api-key", TEST_API_KEY)
        .header("content-type", "application/json")
        .body("{\"network_data\": ")
        .reply(&api::routes(app.state.clone()))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_combined_optimization_without_inputs_fails() {
    let app = create_test_app();
    let response = post_with_key(&app, "/api/optimize-gaming", &json!({})).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(&response)["detail"], "All optimization attempts failed");
}

#[tokio::test]
async fn test_combined_optimization_partial_inputs() {
    let app = create_test_app();
    let response = post_with_key(
        &app,
        "/api/optimize-gaming",
        &json!({ "network_data": { "ping": 20, "jitter": 2, "packet_loss": 0 }, "servers": [] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(&response);
    assert!(body["network_recommendations"].is_object());
    assert!(body["system_recommendations"].is_null());
    assert!(body["server_recommendations"].is_null());
}

#[tokio::test]
async fn test_missing_or_wrong_api_key_unauthorized() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());
    let body = json!({ "network_data": { "ping": 20, "jitter": 2, "packet_loss": 0 } });

    let missing = warp::test::request()
        .method("POST")
        .path("/api/optimize-network")
        .json(&body)
        .reply(&routes)
        .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = warp::test::request()
        .method("POST")
        .path("/api/optimize-network")
        .header("x-api-key", "nope")
        .json(&body)
        .reply(&routes)
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_routes_require_bearer_token() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());

    let response = warp::test::request().path("/api/games").reply(&routes).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = warp::test::request()
        .path("/api/games")
        .header("authorization", "Bearer not.a.token")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(&response)["detail"], "Could not validate credentials");
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());
    let registration = json!({ "email": "ace@example.com", "username": "ace", "password": "hunter22" });

    let response = warp::test::request()
        .method("POST")
        .path("/api/auth/register")
        .json(&registration)
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response)["token_type"], "bearer");

    let duplicate = warp::test::request()
        .method("POST")
        .path("/api/auth/register")
        .json(&registration)
        .reply(&routes)
        .await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&duplicate)["detail"], "Email already registered");

    let bad_login = warp::test::request()
        .method("POST")
        .path("/api/auth/login")
        .json(&json!({ "email": "ace@example.com", "password": "wrong" }))
        .reply(&routes)
        .await;
    assert_eq!(bad_login.status(), StatusCode::UNAUTHORIZED);

    let login = warp::test::request()
        .method("POST")
        .path("/api/auth/login")
        .json(&json!({ "email": "ace@example.com", "password": "hunter22" }))
        .reply(&routes)
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let token = body_json(&login)["access_token"].as_str().unwrap().to_string();

    let profile = warp::test::request()
        .path("/api/user/profile")
        .header("authorization", format!("Bearer {}", token))
        .reply(&routes)
        .await;
    assert_eq!(profile.status(), StatusCode::OK);
    let body = body_json(&profile);
    assert_eq!(body["username"], "ace");
    assert_eq!(body["email"], "ace@example.com");
}

#[tokio::test]
async fn test_password_reset_token_is_single_use() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());
    let (mut user, _) = create_test_user(&app, "reset@example.com").await;
    user.hashed_password = hash_password("old-password").unwrap();
    app.store().put_user(user.clone()).await.unwrap();

    let forgot = warp::test::request()
        .method("POST")
        .path("/api/auth/forgot-password")
        .json(&json!({ "email": "unknown@example.com" }))
        .reply(&routes)
        .await;
    assert_eq!(forgot.status(), StatusCode::OK);

    app.store()
        .put_reset_token(ResetToken {
            token: "known-token".to_string(),
            user_id: user.id.clone(),
            expires_at: Utc::now() + Duration::minutes(60),
        })
        .await
        .unwrap();

    let reset_body = json!({ "token": "known-token", "new_password": "new-password" });
    let reset = warp::test::request()
        .method("POST")
        .path("/api/auth/reset-password")
        .json(&reset_body)
        .reply(&routes)
        .await;
    assert_eq!(reset.status(), StatusCode::OK);

    let reused = warp::test::request()
        .method("POST")
        .path("/api/auth/reset-password")
        .json(&reset_body)
        .reply(&routes)
        .await;
    assert_eq!(reused.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&reused)["detail"], "Invalid reset token");

    let login = warp::test::request()
        .method("POST")
        .path("/api/auth/login")
        .json(&json!({ "email": "reset@example.com", "password": "new-password" }))
        .reply(&routes)
        .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_registered_game_round_trip() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());
    let (_, bearer) = create_test_user(&app, "gamer@example.com").await;

    let register = warp::test::request()
        .method("POST")
        .path("/api/games/register")
        .header("authorization", &bearer)
        .json(&json!([{
            "id": "deadlock",
            "name": "Deadlock",
            "slug": "deadlock",
            "source": "steam",
            "platforms": ["PC", "Steam Deck"]
        }]))
        .reply(&routes)
        .await;
    assert_eq!(register.status(), StatusCode::OK);

    let fetched = warp::test::request()
        .path("/api/games/deadlock")
        .header("authorization", &bearer)
        .reply(&routes)
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let game = body_json(&fetched);
    assert_eq!(game["id"], "deadlock");
    assert_eq!(game["name"], "Deadlock");
    assert_eq!(game["platforms"], json!(["PC", "Steam Deck"]));

    let detected = warp::test::request()
        .path("/api/games/detected")
        .header("authorization", &bearer)
        .reply(&routes)
        .await;
    let ids: Vec<String> = body_json(&detected)
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["deadlock".to_string()]);

    let missing = warp::test::request()
        .path("/api/games/unknown")
        .header("authorization", &bearer)
        .reply(&routes)
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(&missing)["detail"], "Game not found");
}

#[tokio::test]
async fn test_game_optimization_recorded_in_history() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());
    let (_, bearer) = create_test_user(&app, "tuner@example.com").await;

    warp::test::request()
        .method("POST")
        .path("/api/games/register")
        .header("authorization", &bearer)
        .json(&json!([{ "id": "cs2", "name": "Counter-Strike 2", "slug": "cs2", "source": "steam" }]))
        .reply(&routes)
        .await;

    let sample = warp::test::request()
        .method("POST")
        .path("/api/metrics/samples")
        .header("authorization", &bearer)
        .json(&json!({
            "game_id": "cs2",
            "metric_type": "system",
            "cpu_usage": 95, "gpu_usage": 60, "ram_usage": 70, "fps": 45, "temperature": 88
        }))
        .reply(&routes)
        .await;
    assert_eq!(sample.status(), StatusCode::CREATED);

    let optimize = warp::test::request()
        .method("POST")
        .path("/api/games/cs2/optimize")
        .header("authorization", &bearer)
        .json(&json!({ "optimizationTypes": ["both"] }))
        .reply(&routes)
        .await;
    assert_eq!(optimize.status(), StatusCode::OK);
    let body = body_json(&optimize);
    assert_eq!(body["success"], true);
    assert_eq!(body["game"]["isOptimized"], true);
    assert!(body["issues_detected"]["system"].is_object());
    assert!(body["issues_detected"]["network"].is_object());
    let optimization_id = body["optimizationId"].as_str().unwrap().to_string();

    let status = warp::test::request()
        .path(&format!("/api/optimizations/status/{}", optimization_id))
        .header("authorization", &bearer)
        .reply(&routes)
        .await;
    assert_eq!(status.status(), StatusCode::OK);
    assert_eq!(body_json(&status)["gameId"], "cs2");

    let history = warp::test::request()
        .path("/api/optimizations/history")
        .header("authorization", &bearer)
        .reply(&routes)
        .await;
    let entries = body_json(&history)["optimizations"].as_array().unwrap().clone();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["gameName"], "Counter-Strike 2");
    assert_eq!(entries[0]["types"], json!(["both"]));
}

#[tokio::test]
async fn test_metric_samples_validated_and_queryable() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());
    let (_, bearer) = create_test_user(&app, "stats@example.com").await;

    let invalid = warp::test::request()
        .method("POST")
        .path("/api/metrics/samples")
        .header("authorization", &bearer)
        .json(&json!({
            "metric_type": "system",
            "cpu_usage": 150, "gpu_usage": 60, "ram_usage": 70, "fps": 45, "temperature": 60
        }))
        .reply(&routes)
        .await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let valid = warp::test::request()
        .method("POST")
        .path("/api/metrics/samples")
        .header("authorization", &bearer)
        .json(&json!({ "metric_type": "network", "ping": 40, "jitter": 3, "packet_loss": 0.2 }))
        .reply(&routes)
        .await;
    assert_eq!(valid.status(), StatusCode::CREATED);

    let query = warp::test::request()
        .path("/api/metrics/samples?type=network&hours=1")
        .header("authorization", &bearer)
        .reply(&routes)
        .await;
    assert_eq!(query.status(), StatusCode::OK);
    assert_eq!(body_json(&query)["count"], 1);
}

#[tokio::test]
async fn test_metric_query_bounds_rejected() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());
    let (_, bearer) = create_test_user(&app, "bounds@example.com").await;

    for path in [
        "/api/metrics/samples?hours=9223372036854775807",
        "/api/metrics/samples?hours=0",
        "/api/metrics/samples?hours=-3",
        "/api/metrics/samples?limit=-1",
    ] {
        let response = warp::test::request()
            .path(path)
            .header("authorization", &bearer)
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", path);
    }

    let capped = warp::test::request()
        .path("/api/metrics/samples?hours=8760&limit=999999")
        .header("authorization", &bearer)
        .reply(&routes)
        .await;
    assert_eq!(capped.status(), StatusCode::OK);
    assert_eq!(body_json(&capped)["count"], 0);
}

#[tokio::test]
async fn test_post_without_body_requires_length() {
    let app = create_test_app();
    let response = warp::test::request()
        .method("POST")
        .path("/api/optimize-network")
        .header("x-api-key", TEST_API_KEY)
        .reply(&api::routes(app.state.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::LENGTH_REQUIRED);
    assert_eq!(body_json(&response)["detail"], "Request body required");
}

#[tokio::test]
async fn test_game_routes_aliases_and_methods() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());
    let (_, bearer) = create_test_user(&app, "alias@example.com").await;

    let wrong_method = warp::test::request()
        .path("/api/games/register")
        .header("authorization", &bearer)
        .reply(&routes)
        .await;
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);

    let listed = warp::test::request()
        .path("/games")
        .header("authorization", &bearer)
        .reply(&routes)
        .await;
    assert_eq!(listed.status(), StatusCode::OK);
    assert!(body_json(&listed).is_array());

    let estimate = warp::test::request()
        .method("POST")
        .path("/ml/optimize-game/valorant")
        .reply(&routes)
        .await;
    assert_eq!(estimate.status(), StatusCode::OK);
    let body = body_json(&estimate);
    assert_eq!(body["success"], true);
    assert_eq!(body["gameId"], "valorant");
    assert_eq!(body["improvements"]["latency"], 25);
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());

    let unknown = warp::test::request().path("/api/does-not-exist").reply(&routes).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(unknown.headers()["x-instance-id"], TEST_INSTANCE_ID);

    let wrong_method = warp::test::request()
        .method("DELETE")
        .path("/api/vpn/status")
        .reply(&routes)
        .await;
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_service_metrics_count_requests() {
    let app = create_test_app();
    let routes = api::routes(app.state.clone());

    warp::test::request().path("/api/metrics/ping").reply(&routes).await;
    let metrics = warp::test::request()
        .path("/metrics")
        .header("x-api-key", TEST_API_KEY)
        .reply(&routes)
        .await;
    assert_eq!(metrics.status(), StatusCode::OK);
    assert!(body_json(&metrics)["requests_processed"].as_u64().unwrap() >= 1);

    let prometheus = warp::test::request()
        .path("/metrics?format=prometheus")
        .header("x-api-key", TEST_API_KEY)
        .reply(&routes)
        .await;
    let text = String::from_utf8(prometheus.body().to_vec()).unwrap();
    assert!(text.contains("http_requests_total"));
}
