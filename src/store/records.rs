//! Persisted record types for the users, games, user-games, metrics and reset-token tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{NetworkAnalysis, OptimizationStep, SystemAnalysis};

/// Subscription tier stored on the user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Player,
    Coop,
    Alliance,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Player => "player",
            SubscriptionTier::Coop => "coop",
            SubscriptionTier::Alliance => "alliance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub notifications_enabled: bool,
    pub theme: String,
    pub language: String,
    pub auto_optimization: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            theme: "dark".to_string(),
            language: "en-US".to_string(),
            auto_optimization: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    #[serde(default)]
    pub tier: SubscriptionTier,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub settings: UserSettings,
}

/// Game record, camelCase on the wire to match the desktop client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub is_detected: bool,
    #[serde(default)]
    pub is_optimized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_optimized: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_metrics: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_detected_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Mark the game optimized with the given type label
    pub fn mark_optimized(&mut self, optimization_type: &str, at: DateTime<Utc>) {
        self.is_optimized = true;
        self.last_optimized = Some(at);
        self.optimization_type = Some(optimization_type.to_string());
    }
}

/// Readings from a system telemetry sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemReading {
    pub cpu_usage: f64,
    pub gpu_usage: f64,
    pub ram_usage: f64,
    pub fps: f64,
    pub temperature: f64,
}

/// Readings from a network telemetry sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReading {
    pub ping: f64,
    pub jitter: f64,
    pub packet_loss: f64,
    #[serde(default)]
    pub download_speed: f64,
    #[serde(default)]
    pub upload_speed: f64,
}

/// Audit event recorded alongside telemetry (server lookups, applied optimizations)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub name: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric_type", rename_all = "snake_case")]
pub enum MetricData {
    System(SystemReading),
    Network(NetworkReading),
    Event(EventPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    System,
    Network,
    Event,
}

impl MetricType {
    pub fn matches(&self, data: &MetricData) -> bool {
        matches!(
            (self, data),
            (MetricType::System, MetricData::System(_))
                | (MetricType::Network, MetricData::Network(_))
                | (MetricType::Event, MetricData::Event(_))
        )
    }
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(MetricType::System),
            "network" => Ok(MetricType::Network),
            "event" => Ok(MetricType::Event),
            other => Err(format!("Unknown metric type: {}", other)),
        }
    }
}

/// Filter over one user's samples. Matches are returned newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: usize,
    pub metric_type: Option<MetricType>,
    pub game_id: Option<String>,
}

impl MetricQuery {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, limit: usize) -> Self {
        Self {
            start,
            end,
            limit,
            metric_type: None,
            game_id: None,
        }
    }

    pub fn of_type(mut self, metric_type: Option<MetricType>) -> Self {
        self.metric_type = metric_type;
        self
    }

    pub fn for_game(mut self, game_id: &str) -> Self {
        self.game_id = Some(game_id.to_string());
        self
    }

    pub fn matches(&self, sample: &MetricSample) -> bool {
        self.metric_type.map_or(true, |t| t.matches(&sample.data))
            && self
                .game_id
                .as_deref()
                .map_or(true, |game| sample.game_id.as_deref() == Some(game))
    }
}

/// Append-only telemetry sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub game_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub data: MetricData,
}

impl MetricSample {
    pub fn new(user_id: &str, game_id: Option<String>, data: MetricData) -> Self {
        Self {
            id: format!("metric-{}", uuid::Uuid::new_v4()),
            user_id: user_id.to_string(),
            game_id,
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn system(&self) -> Option<&SystemReading> {
        match &self.data {
            MetricData::System(reading) => Some(reading),
            _ => None,
        }
    }

    pub fn network(&self) -> Option<&NetworkReading> {
        match &self.data {
            MetricData::Network(reading) => Some(reading),
            _ => None,
        }
    }
}

/// Persisted result of applying recommendations to a user's game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub optimization_id: String,
    pub game_id: String,
    pub timestamp: DateTime<Utc>,
    pub optimization_type: String,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub steps: Vec<OptimizationStep>,
    #[serde(default)]
    pub system_analysis: Option<SystemAnalysis>,
    #[serde(default)]
    pub network_analysis: Option<NetworkAnalysis>,
    pub requires_client: bool,
}

/// User to game relation, carrying the optimization history for that pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGame {
    pub user_id: String,
    pub game_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub detected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub detection_method: Option<String>,
    #[serde(default)]
    pub optimizations: Vec<OptimizationRecord>,
}

impl UserGame {
    pub fn new(user_id: &str, game_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            game_id: game_id.to_string(),
            timestamp: Utc::now(),
            detected_at: None,
            detection_method: None,
            optimizations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetToken {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_sample_json_shape() {
        let sample = MetricSample::new(
            "user_1",
            Some("valorant".to_string()),
            MetricData::Network(NetworkReading {
                ping: 35.0,
                jitter: 4.0,
                packet_loss: 0.1,
                download_speed: 120.0,
                upload_speed: 20.0,
            }),
        );

        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(value["metric_type"], "network");
        assert_eq!(value["ping"], 35.0);
        assert_eq!(value["game_id"], "valorant");
        assert!(value["id"].as_str().unwrap().starts_with("metric-"));

        let parsed: MetricSample = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, sample);
    }

    #[test]
    fn test_metric_type_filter() {
        let system = MetricData::System(SystemReading {
            cpu_usage: 50.0,
            gpu_usage: 60.0,
            ram_usage: 70.0,
            fps: 144.0,
            temperature: 65.0,
        });
        assert!(MetricType::System.matches(&system));
        assert!(!MetricType::Network.matches(&system));
        assert_eq!("network".parse::<MetricType>(), Ok(MetricType::Network));
        assert!("disk".parse::<MetricType>().is_err());
    }

    #[test]
    fn test_game_serializes_camel_case() {
        let game = Game {
            id: "cs2".to_string(),
            name: "Counter-Strike 2".to_string(),
            slug: "cs2".to_string(),
            genre: Some("FPS".to_string()),
            publisher: Some("Valve".to_string()),
            release_year: Some(2023),
            platforms: vec!["PC".to_string()],
            is_detected: true,
            is_optimized: false,
            last_optimized: None,
            optimization_type: None,
            performance_metrics: None,
            source: None,
            app_id: None,
            install_path: None,
            executable_path: None,
            detected_at: None,
            last_detected_at: None,
        };

        let value = serde_json::to_value(&game).unwrap();
        assert_eq!(value["releaseYear"], 2023);
        assert_eq!(value["isDetected"], true);
        assert!(value.get("lastOptimized").is_none());
    }

    #[test]
    fn test_reset_token_expiry() {
        let now = Utc::now();
        let token = ResetToken {
            token: "abc".to_string(),
            user_id: "user_1".to_string(),
            expires_at: now + chrono::Duration::minutes(5),
        };
        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + chrono::Duration::minutes(5)));
    }
}
