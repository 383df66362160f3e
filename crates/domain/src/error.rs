//! Domain-level error taxonomy.

use thiserror::Error;

/// Errors raised while constructing or mutating an [`crate::order::Order`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("order must contain at least one piece")]
    EmptyOrder,
}
