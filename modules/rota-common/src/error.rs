use thiserror::Error;

/// Failure taxonomy shared across the workspace.
///
/// The first four variants are caller-input or authorization errors and are
/// never retried; `Infra` wraps store/connectivity failures, which fail the
/// request as a whole.
#[derive(Error, Debug)]
pub enum RotaError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error(transparent)]
    Infra(#[from] anyhow::Error),
}
