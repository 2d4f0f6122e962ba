use std::sync::Arc;

use crate::config::AppConfig;
use crate::engine::RecommendationService;
use crate::metrics::ServiceMetrics;
use crate::store::StoreClient;

/// Shared handles passed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: StoreClient,
    pub recommender: RecommendationService,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: StoreClient,
        recommender: RecommendationService,
        metrics: ServiceMetrics,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            recommender,
            metrics: Arc::new(metrics),
        }
    }

    pub fn instance_id(&self) -> &str {
        self.config.instance_id()
    }
}
