//! Shared identifiers for the order orchestrator.

pub mod ids;

pub use ids::{ClientId, OrderId, SagaId};
