use thiserror::Error;

/// Errors that can occur while persisting or retrieving orders and
/// cancellation-saga records.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("order {0} not found")]
    OrderNotFound(common::OrderId),

    #[error("cancellation saga {0} not found")]
    SagaNotFound(common::SagaId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("order has no pieces: {0}")]
    InvalidOrder(#[from] domain::OrderError),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
