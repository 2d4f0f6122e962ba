use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::common::constants::MODEL_FILE_EXTENSION;
use super::artifact::{ModelArtifact, ModelKind};
use super::cache::ModelCache;
use super::errors::ModelError;

/// How a recommendation request is served
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    ModelBacked(ModelArtifact),
    HeuristicFallback,
}

/// Loads model artifacts through the cache, falling back to disk
#[derive(Clone)]
pub struct ModelStore {
    cache: Arc<dyn ModelCache>,
    models_dir: PathBuf,
    ttl: Duration,
}

impl ModelStore {
    pub fn new(cache: Arc<dyn ModelCache>, models_dir: &Path, ttl: Duration) -> Self {
        Self {
            cache,
            models_dir: models_dir.to_path_buf(),
            ttl,
        }
    }

    pub fn artifact_path(&self, kind: ModelKind) -> PathBuf {
        self.models_dir.join(format!("{}.{}", kind.name(), MODEL_FILE_EXTENSION))
    }

    /// Cached artifact if fresh, else read from disk and cache it.
    /// A missing file is `Ok(None)`; a cache read failure falls through to disk.
    pub async fn load(&self, kind: ModelKind) -> Result<Option<ModelArtifact>, ModelError> {
        match self.cache.get(kind.name()).await {
            Ok(Some(blob)) => {
                debug!("📦 Loading {} model from {} cache", kind, self.cache.backend());
                return ModelArtifact::from_slice(kind, &blob).map(Some);
            }
            Ok(None) => {}
            Err(e) => warn!("⚠️ Model cache read failed for {}: {}", kind, e),
        }

        let path = self.artifact_path(kind);
        let blob = match tokio::fs::read(&path).await {
            Ok(blob) => blob,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Model file {} not found", path.display());
                return Ok(None);
            }
            Err(e) => return Err(ModelError::Io(e)),
        };

        let artifact = ModelArtifact::from_slice(kind, &blob)?;
        info!("📂 Loaded {} model {} from disk", kind, artifact.version);

        if let Err(e) = self.cache.set(kind.name(), blob, self.ttl).await {
            warn!("⚠️ Failed to cache {} model: {}", kind, e);
        }
        Ok(Some(artifact))
    }

    /// Model-backed when a valid artifact is available; every failure downgrades to the heuristics
    pub async fn strategy(&self, kind: ModelKind) -> Strategy {
        match self.load(kind).await {
            Ok(Some(artifact)) => Strategy::ModelBacked(artifact),
            Ok(None) => {
                warn!("⚠️ {} model not available, using fallback logic", kind);
                Strategy::HeuristicFallback
            }
            Err(e) => {
                warn!("⚠️ {} model failed to load ({}), using fallback logic", kind, e);
                Strategy::HeuristicFallback
            }
        }
    }

    pub async fn evict(&self, kind: ModelKind) -> Result<bool, ModelError> {
        let removed = self.cache.expire(kind.name()).await?;
        if removed {
            info!("🧹 Evicted cached {} model", kind);
        }
        Ok(removed)
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    /// "memory" for the in-process cache, otherwise "connected" or "error"
    pub async fn cache_status(&self) -> &'static str {
        match self.cache.backend() {
            "memory" => "memory",
            _ => match self.cache.ping().await {
                Ok(()) => "connected",
                Err(e) => {
                    warn!("⚠️ Model cache health check failed: {}", e);
                    "error"
                }
            },
        }
    }
}
