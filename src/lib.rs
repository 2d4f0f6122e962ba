//! GamePath API: account, game catalog, telemetry and optimization recommendation
//! service for the GamePath desktop client.

pub mod api;
pub mod auth;
pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod game_detection;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod state;
pub mod store;
