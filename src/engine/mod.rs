pub mod errors;
pub mod heuristics;
pub mod optimizer;
pub mod recommend;
pub mod types;

pub use errors::EngineError;
pub use optimizer::{
    generate_steps, NetworkAnalysis, NetworkOptimizer, OptimizationStep, Recommendation, SystemAnalysis,
    SystemOptimizer,
};
pub use recommend::RecommendationService;
pub use types::Validate;
