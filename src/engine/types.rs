//! Request and response payloads of the recommendation endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Payload checks applied before any handler logic runs
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub(crate) fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "Value must be a finite number"));
    }
    if value < 0.0 {
        return Err(ValidationError::new(field, "Value must be non-negative"));
    }
    Ok(())
}

pub(crate) fn percentage(field: &str, value: f64) -> Result<(), ValidationError> {
    non_negative(field, value)?;
    if value > 100.0 {
        return Err(ValidationError::new(field, "Usage percentage must be between 0 and 100"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    pub ping: f64,
    pub jitter: f64,
    pub packet_loss: f64,
    #[serde(default)]
    pub download_speed: f64,
    #[serde(default)]
    pub upload_speed: f64,
    #[serde(default)]
    pub connection_type: String,
    #[serde(default)]
    pub isp: String,
    #[serde(default)]
    pub time_of_day: String,
}

impl Validate for NetworkData {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("ping", self.ping)?;
        non_negative("jitter", self.jitter)?;
        non_negative("packet_loss", self.packet_loss)?;
        non_negative("download_speed", self.download_speed)?;
        non_negative("upload_speed", self.upload_speed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemData {
    pub cpu_usage: f64,
    pub gpu_usage: f64,
    pub ram_usage: f64,
    pub fps: f64,
    pub temperature: f64,
    #[serde(default)]
    pub game: String,
    #[serde(default)]
    pub cpu_model: String,
    #[serde(default)]
    pub gpu_model: String,
}

impl Validate for SystemData {
    fn validate(&self) -> Result<(), ValidationError> {
        percentage("cpu_usage", self.cpu_usage)?;
        percentage("gpu_usage", self.gpu_usage)?;
        percentage("ram_usage", self.ram_usage)?;
        non_negative("fps", self.fps)?;
        non_negative("temperature", self.temperature)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerData {
    pub name: String,
    pub ping: f64,
    pub jitter: f64,
    pub packet_loss: f64,
    pub server_id: i64,
    #[serde(default)]
    pub game_id: i64,
}

impl Validate for ServerData {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("ping", self.ping)?;
        non_negative("jitter", self.jitter)?;
        non_negative("packet_loss", self.packet_loss)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkOptimizationRequest {
    pub network_data: NetworkData,
}

impl Validate for NetworkOptimizationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        self.network_data.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemOptimizationRequest {
    pub system_data: SystemData,
}

impl Validate for SystemOptimizationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        self.system_data.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerRecommendationRequest {
    pub servers: Vec<ServerData>,
}

impl Validate for ServerRecommendationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        self.servers.iter().try_for_each(Validate::validate)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GamingOptimizationRequest {
    #[serde(default)]
    pub network_data: Option<NetworkData>,
    #[serde(default)]
    pub system_data: Option<SystemData>,
    #[serde(default)]
    pub servers: Option<Vec<ServerData>>,
}

impl Validate for GamingOptimizationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(network) = &self.network_data {
            network.validate()?;
        }
        if let Some(system) = &self.system_data {
            system.validate()?;
        }
        if let Some(servers) = &self.servers {
            servers.iter().try_for_each(Validate::validate)?;
        }
        Ok(())
    }
}

/// Where a recommendation came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecommendation {
    pub dns_settings: String,
    pub protocol: String,
    pub qos_enabled: bool,
    pub qos_priority: String,
    #[serde(flatten)]
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareTier {
    HighEnd,
    MidRange,
    LowEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemRecommendation {
    pub graphics_settings: String,
    pub resolution: String,
    pub vsync: String,
    pub process_priority: String,
    pub bottleneck_diagnosis: String,
    pub hardware_tier: HardwareTier,
    #[serde(flatten)]
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecommendation {
    pub server_id: i64,
    pub name: String,
    pub predicted_quality: f64,
    pub rank: usize,
    pub is_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkOptimizationResponse {
    pub recommendations: NetworkRecommendation,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemOptimizationResponse {
    pub recommendations: SystemRecommendation,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerRecommendationResponse {
    pub recommendations: Vec<ServerRecommendation>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GamingOptimizationResponse {
    pub network_recommendations: Option<NetworkRecommendation>,
    pub system_recommendations: Option<SystemRecommendation>,
    pub server_recommendations: Option<Vec<ServerRecommendation>>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_usage_above_100_rejected() {
        let request: SystemOptimizationRequest = serde_json::from_value(serde_json::json!({
            "system_data": {
                "cpu_usage": 150.0, "gpu_usage": 50.0, "ram_usage": 50.0,
                "fps": 60.0, "temperature": 70.0,
                "game": "valorant", "cpu_model": "i7", "gpu_model": "rtx 2070"
            }
        }))
        .unwrap();

        let err = request.validate().unwrap_err();
        assert_eq!(err.field, "cpu_usage");
    }

    #[test]
    fn test_network_metadata_is_optional() {
        let request: NetworkOptimizationRequest = serde_json::from_value(serde_json::json!({
            "network_data": {"ping": 20, "jitter": 2, "packet_loss": 0}
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.network_data.download_speed, 0.0);
    }

    #[test]
    fn test_negative_server_metric_rejected() {
        let request = ServerRecommendationRequest {
            servers: vec![ServerData {
                name: "eu".to_string(),
                ping: 30.0,
                jitter: -1.0,
                packet_loss: 0.0,
                server_id: 1,
                game_id: 1,
            }],
        };
        assert_eq!(request.validate().unwrap_err().field, "jitter");
    }

    #[test]
    fn test_non_finite_rejected() {
        let data = NetworkData {
            ping: f64::INFINITY,
            jitter: 0.0,
            packet_loss: 0.0,
            download_speed: 0.0,
            upload_speed: 0.0,
            connection_type: String::new(),
            isp: String::new(),
            time_of_day: String::new(),
        };
        assert!(data.validate().is_err());
    }
}
