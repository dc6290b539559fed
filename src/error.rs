//! Engine error types.
//!
//! Infeasibility and timeouts are not errors: they are reported on the
//! result (`feasible`, `completed`). Errors cover rejected input,
//! collaborator failures and misuse of the recommendation workflow.

use thiserror::Error;

use crate::models::RequestId;
use crate::validation::ValidationError;

/// Failure of an external collaborator (repository or result store).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InfraError {
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Retry budget exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

/// Errors returned by the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid request: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Infrastructure error: {0}")]
    Infra(#[from] InfraError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Request {0} is already running")]
    AlreadyRunning(RequestId),

    #[error("Unknown request {0}")]
    UnknownRequest(RequestId),

    #[error("Recommendation not found: {0}")]
    RecommendationNotFound(String),

    #[error("Recommendation {id} already {status}")]
    RecommendationDecided { id: String, status: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Vec<ValidationError>> for EngineError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

impl From<ValidationError> for EngineError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(vec![error])
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
