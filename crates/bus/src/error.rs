use thiserror::Error;

/// Errors raised while publishing to or consuming from the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_lapin::PoolError),

    #[error("failed to serialize message payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Raised by a [`crate::MessageHandler`] impl to nack the delivery and
    /// let the broker redeliver; the wrapped error is logged but never
    /// downcast by the bus itself.
    #[error("message handler failed: {0}")]
    Handler(String),
}

pub type Result<T> = std::result::Result<T, BusError>;
