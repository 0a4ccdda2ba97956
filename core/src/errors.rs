//! Crate-wide error taxonomy.
//!
//! `run_cycle` never returns one of these directly — a `CycleInternal`
//! condition is captured into `CycleReport.error` instead, so the cycle
//! counter still advances. `ingest`/`ingest_batch` and the Executor do
//! return `Result<_, CoreError>`, since rejection at those boundaries is
//! synchronous.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid transaction: {0}")]
    InputInvalid(String),
    #[error("action blocked: {0}")]
    StateConflict(String),
    #[error("action execution failed: {0}")]
    ExecutionFailed(String),
    #[error("rollback failed: {0}")]
    RollbackFailed(String),
    #[error("internal cycle error: {0}")]
    CycleInternal(String),
}
