use common::OrderId;
use thiserror::Error;

/// Errors raised while running the confirmation or cancellation saga, or
/// the warehouse ingress.
#[derive(Debug, Error)]
pub enum SagaError {
    #[error("order {0} not eligible for cancellation in its current state")]
    AdmissionViolation(OrderId),

    #[error("repository error: {0}")]
    Repository(#[from] repository::RepositoryError),

    #[error("bus error: {0}")]
    Bus(#[from] bus::BusError),

    #[error("domain error: {0}")]
    Domain(#[from] domain::OrderError),

    #[error("http error fetching auth public key: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SagaError>;
