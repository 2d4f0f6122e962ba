use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Non-finite input: {0}")]
    NonFiniteInput(String),

    #[error("All optimization attempts failed")]
    AllBranchesFailed,
}
