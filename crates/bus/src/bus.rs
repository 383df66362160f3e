use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::message::IncomingMessage;

/// Invoked once per message delivered to a bound queue.
///
/// Implementations ack by returning `Ok(())`; a returned error nacks the
/// message so the broker can redeliver it (spec §7's "an event for an
/// unknown saga is ... acknowledged" is an explicit `Ok(())` return, not an
/// error).
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: IncomingMessage) -> Result<()>;
}

/// Thin layer over a topic exchange (spec §4 item 1): publish, declare,
/// bind, consume. One bus instance serves all four logical exchanges
/// (`events`, `command`, `saga`, `logs`); the exchange name is always
/// passed explicitly rather than baked into the bus.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes a JSON payload with persistent delivery (spec §6, §4.7).
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &Value) -> Result<()>;

    /// Declares a durable queue.
    async fn declare_queue(&self, queue: &str) -> Result<()>;

    /// Binds a durable queue to an exchange under a routing-key pattern.
    async fn bind(&self, queue: &str, exchange: &str, pattern: &str) -> Result<()>;

    /// Registers a handler to run for every message delivered to `queue`.
    ///
    /// Implementations spawn their own delivery loop; this call returns
    /// once the consumer is registered, not once it stops running.
    async fn consume(&self, queue: &str, handler: Arc<dyn MessageHandler>) -> Result<()>;
}
