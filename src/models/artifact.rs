use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::constants::{NETWORK_MODEL_NAME, SERVER_MODEL_NAME, SYSTEM_MODEL_NAME};
use crate::engine::heuristics::{NetworkRules, ServerRules, SystemRules};
use super::errors::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Network,
    System,
    ServerRecommender,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Network, ModelKind::System, ModelKind::ServerRecommender];

    /// Cache key and artifact file stem
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Network => NETWORK_MODEL_NAME,
            ModelKind::System => SYSTEM_MODEL_NAME,
            ModelKind::ServerRecommender => SERVER_MODEL_NAME,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Network => "Network optimization",
            ModelKind::System => "System optimization",
            ModelKind::ServerRecommender => "Server recommender",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum ModelParams {
    Network(NetworkRules),
    System(SystemRules),
    ServerRecommender(ServerRules),
}

impl ModelParams {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::Network(_) => ModelKind::Network,
            ModelParams::System(_) => ModelKind::System,
            ModelParams::ServerRecommender(_) => ModelKind::ServerRecommender,
        }
    }
}

/// Trained parameters for one of the rule sets, stored as `<models.dir>/<name>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub params: ModelParams,
}

impl ModelArtifact {
    /// Parse an artifact blob and check it carries the expected parameter set
    pub fn from_slice(kind: ModelKind, bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        if artifact.params.kind() != kind {
            return Err(ModelError::KindMismatch {
                name: kind.name().to_string(),
                found: artifact.params.kind().name().to_string(),
            });
        }
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_network_artifact() {
        let blob = br#"{"version": "2024.1", "kind": "network", "params": {"ping_threshold": 80.0}}"#;
        let artifact = ModelArtifact::from_slice(ModelKind::Network, blob).unwrap();

        assert_eq!(artifact.version, "2024.1");
        match artifact.params {
            ModelParams::Network(rules) => {
                assert_eq!(rules.ping_threshold, 80.0);
                assert_eq!(rules.jitter_threshold, 20.0);
            }
            other => panic!("Expected network params, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let blob = br#"{"version": "1", "kind": "system", "params": {}}"#;
        let result = ModelArtifact::from_slice(ModelKind::Network, blob);
        assert!(matches!(result, Err(ModelError::KindMismatch { .. })));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            ModelArtifact::from_slice(ModelKind::System, b"\x80\x04pickle"),
            Err(ModelError::Parse(_))
        ));
    }
}
