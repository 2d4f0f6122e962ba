use chrono::Utc;
use tracing::{error, info, warn};

use crate::common::constants::FALLBACK_MESSAGE;
use crate::models::{ModelArtifact, ModelKind, ModelParams, ModelStore, Strategy};
use super::errors::EngineError;
use super::heuristics::{NetworkRules, ServerRules, SystemRules};
use super::types::{
    GamingOptimizationRequest, GamingOptimizationResponse, NetworkData, NetworkRecommendation,
    Provenance, ServerData, ServerRecommendation, SystemData, SystemRecommendation,
};

fn fallback_provenance() -> Provenance {
    Provenance {
        is_fallback: true,
        message: Some(FALLBACK_MESSAGE.to_string()),
        model_name: None,
        model_version: None,
    }
}

fn model_provenance(kind: ModelKind, artifact: &ModelArtifact) -> Provenance {
    Provenance {
        is_fallback: false,
        message: None,
        model_name: Some(kind.name().to_string()),
        model_version: Some(artifact.version.clone()),
    }
}

/// Serves recommendation requests from trained parameters when present, heuristics otherwise
#[derive(Clone)]
pub struct RecommendationService {
    models: ModelStore,
}

impl RecommendationService {
    pub fn new(models: ModelStore) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    pub async fn optimize_network(&self, data: &NetworkData) -> Result<NetworkRecommendation, EngineError> {
        info!("🌐 Network optimization request for connection type: {}", data.connection_type);
        let kind = ModelKind::Network;

        let recommendation = match self.models.strategy(kind).await {
            Strategy::ModelBacked(artifact) => match &artifact.params {
                ModelParams::Network(rules) => rules.recommend(data, model_provenance(kind, &artifact)),
                _ => NetworkRules::default().recommend(data, fallback_provenance()),
            },
            Strategy::HeuristicFallback => NetworkRules::default().recommend(data, fallback_provenance()),
        };
        Ok(recommendation)
    }

    pub async fn optimize_system(&self, data: &SystemData) -> Result<SystemRecommendation, EngineError> {
        info!("🖥️ System optimization request for game: {}", data.game);
        let kind = ModelKind::System;

        let recommendation = match self.models.strategy(kind).await {
            Strategy::ModelBacked(artifact) => match &artifact.params {
                ModelParams::System(rules) => rules.recommend(data, model_provenance(kind, &artifact)),
                _ => SystemRules::default().recommend(data, fallback_provenance()),
            },
            Strategy::HeuristicFallback => SystemRules::default().recommend(data, fallback_provenance()),
        };
        Ok(recommendation)
    }

    pub async fn recommend_servers(&self, servers: &[ServerData]) -> Result<Vec<ServerRecommendation>, EngineError> {
        info!("🎯 Server recommendation request with {} servers", servers.len());

        match self.models.strategy(ModelKind::ServerRecommender).await {
            Strategy::ModelBacked(ModelArtifact { params: ModelParams::ServerRecommender(rules), .. }) => {
                rules.rank(servers, false)
            }
            _ => ServerRules::default().rank(servers, true),
        }
    }

    /// Run each requested branch independently; fails only when nothing succeeded
    pub async fn optimize_gaming(
        &self,
        request: &GamingOptimizationRequest,
    ) -> Result<GamingOptimizationResponse, EngineError> {
        let mut response = GamingOptimizationResponse {
            network_recommendations: None,
            system_recommendations: None,
            server_recommendations: None,
            timestamp: Utc::now(),
        };

        if let Some(servers) = request.servers.as_deref().filter(|s| !s.is_empty()) {
            match self.recommend_servers(servers).await {
                Ok(ranked) => response.server_recommendations = Some(ranked),
                Err(e) => error!("❌ Error in combined server recommendation: {}", e),
            }
        }

        if let Some(network) = &request.network_data {
            match self.optimize_network(network).await {
                Ok(rec) => response.network_recommendations = Some(rec),
                Err(e) => error!("❌ Error in combined network optimization: {}", e),
            }
        }

        if let Some(system) = &request.system_data {
            match self.optimize_system(system).await {
                Ok(rec) => response.system_recommendations = Some(rec),
                Err(e) => error!("❌ Error in combined system optimization: {}", e),
            }
        }

        if response.server_recommendations.is_none()
            && response.network_recommendations.is_none()
            && response.system_recommendations.is_none()
        {
            warn!("⚠️ Combined optimization produced no results");
            return Err(EngineError::AllBranchesFailed);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InMemoryModelCache;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn service(dir: &std::path::Path) -> RecommendationService {
        let store = ModelStore::new(Arc::new(InMemoryModelCache::new()), dir, Duration::from_secs(60));
        RecommendationService::new(store)
    }

    fn network(ping: f64, jitter: f64, packet_loss: f64) -> NetworkData {
        serde_json::from_value(serde_json::json!({
            "ping": ping, "jitter": jitter, "packet_loss": packet_loss
        }))
        .unwrap()
    }

    fn server(id: i64, ping: f64) -> ServerData {
        ServerData {
            name: format!("srv-{}", id),
            ping,
            jitter: 1.0,
            packet_loss: 0.0,
            server_id: id,
            game_id: 1,
        }
    }

    #[tokio::test]
    async fn test_network_uses_fallback_without_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let rec = service(temp_dir.path()).optimize_network(&network(150.0, 25.0, 3.0)).await.unwrap();

        assert!(rec.provenance.is_fallback);
        assert_eq!(rec.provenance.message.as_deref(), Some(FALLBACK_MESSAGE));
        assert_eq!(rec.protocol, "TCP");
    }

    #[tokio::test]
    async fn test_network_uses_model_parameters() {
        let temp_dir = TempDir::new().unwrap();
        let svc = service(temp_dir.path());
        std::fs::write(
            svc.models().artifact_path(ModelKind::Network),
            r#"{"version": "v7", "kind": "network", "params": {"ping_threshold": 10.0, "degraded_dns": "Quad9"}}"#,
        )
        .unwrap();

        let rec = svc.optimize_network(&network(20.0, 2.0, 0.0)).await.unwrap();
        assert!(!rec.provenance.is_fallback);
        assert_eq!(rec.provenance.model_version.as_deref(), Some("v7"));
        assert_eq!(rec.dns_settings, "Quad9");
        assert_eq!(rec.protocol, "UDP");
    }

    #[tokio::test]
    async fn test_server_model_marks_results_not_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let svc = service(temp_dir.path());
        std::fs::write(
            svc.models().artifact_path(ModelKind::ServerRecommender),
            r#"{"version": "v1", "kind": "server_recommender", "params": {"ping_weight": 1.0}}"#,
        )
        .unwrap();

        let ranked = svc.recommend_servers(&[server(1, 40.0)]).await.unwrap();
        assert!(!ranked[0].is_fallback);
        assert_eq!(ranked[0].predicted_quality, 100.0 - 40.0 - 2.0);
    }

    #[tokio::test]
    async fn test_optimize_gaming_partial_success() {
        let temp_dir = TempDir::new().unwrap();
        let svc = service(temp_dir.path());

        let request = GamingOptimizationRequest {
            network_data: Some(network(20.0, 2.0, 0.0)),
            system_data: None,
            servers: Some(vec![server(1, f64::NAN)]),
        };
        let response = svc.optimize_gaming(&request).await.unwrap();

        assert!(response.network_recommendations.is_some());
        assert!(response.server_recommendations.is_none());
        assert!(response.system_recommendations.is_none());
    }

    #[tokio::test]
    async fn test_optimize_gaming_with_nothing_requested_fails() {
        let temp_dir = TempDir::new().unwrap();
        let svc = service(temp_dir.path());

        let result = svc.optimize_gaming(&GamingOptimizationRequest::default()).await;
        assert!(matches!(result, Err(EngineError::AllBranchesFailed)));

        let empty_servers = GamingOptimizationRequest {
            servers: Some(Vec::new()),
            ..GamingOptimizationRequest::default()
        };
        assert!(svc.optimize_gaming(&empty_servers).await.is_err());
    }
}
