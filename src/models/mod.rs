pub mod artifact;
pub mod cache;
pub mod errors;
pub mod store;

pub use artifact::{ModelArtifact, ModelKind, ModelParams};
pub use cache::{InMemoryModelCache, ModelCache};
#[cfg(feature = "redis")]
pub use cache::RedisModelCache;
pub use errors::ModelError;
pub use store::{ModelStore, Strategy};
