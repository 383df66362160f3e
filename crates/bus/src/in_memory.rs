use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::bus::{MessageBus, MessageHandler};
use crate::error::Result;
use crate::message::{IncomingMessage, matches_binding};

struct Binding {
    queue: String,
    pattern: String,
}

#[derive(Default)]
struct State {
    bindings: Vec<Binding>,
    handlers: Vec<(String, Arc<dyn MessageHandler>)>,
    published: Vec<(String, String, Value)>,
}

/// In-memory [`MessageBus`] used by saga and facade unit tests.
///
/// Unlike [`crate::lapin_bus::LapinBus`] this dispatches synchronously:
/// `publish` calls every handler whose binding matches the routing key
/// before returning, the same way the reference workspace's in-memory
/// service doubles resolve immediately instead of over the network.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    state: Arc<Mutex<State>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages published so far, in order, for test assertions.
    pub fn published(&self) -> Vec<(String, String, Value)> {
        self.state.lock().unwrap().published.clone()
    }

    /// Convenience for tests: the payloads published under an exact routing key.
    pub fn published_to(&self, routing_key: &str) -> Vec<Value> {
        self.published()
            .into_iter()
            .filter(|(_, key, _)| key == routing_key)
            .map(|(_, _, payload)| payload)
            .collect()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &Value) -> Result<()> {
        let handlers: Vec<Arc<dyn MessageHandler>> = {
            let mut state = self.state.lock().unwrap();
            state
                .published
                .push((exchange.to_string(), routing_key.to_string(), payload.clone()));

            let matching_queues: Vec<String> = state
                .bindings
                .iter()
                .filter(|b| matches_binding(routing_key, &b.pattern))
                .map(|b| b.queue.clone())
                .collect();

            state
                .handlers
                .iter()
                .filter(|(queue, _)| matching_queues.contains(queue))
                .map(|(_, handler)| handler.clone())
                .collect()
        };

        let message = IncomingMessage::new(routing_key, payload.clone());
        for handler in handlers {
            handler.handle(message.clone()).await?;
        }

        Ok(())
    }

    async fn declare_queue(&self, _queue: &str) -> Result<()> {
        Ok(())
    }

    async fn bind(&self, queue: &str, _exchange: &str, pattern: &str) -> Result<()> {
        self.state.lock().unwrap().bindings.push(Binding {
            queue: queue.to_string(),
            pattern: pattern.to_string(),
        });
        Ok(())
    }

    async fn consume(&self, queue: &str, handler: Arc<dyn MessageHandler>) -> Result<()> {
        self.state.lock().unwrap().handlers.push((queue.to_string(), handler));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MessageHandler for CountingHandler {
        async fn handle(&self, _message: IncomingMessage) -> Result<()> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn publish_dispatches_to_bound_consumers() {
        let bus = InMemoryBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        bus.declare_queue("warehouse-events").await.unwrap();
        bus.bind("warehouse-events", "events", "warehouse.#").await.unwrap();
        bus.consume("warehouse-events", Arc::new(CountingHandler { count: count.clone() }))
            .await
            .unwrap();

        bus.publish("events", "warehouse.order", &serde_json::json!({"order_id": 1}))
            .await
            .unwrap();
        bus.publish("events", "delivery.result", &serde_json::json!({"order_id": 1}))
            .await
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.published().len(), 2);
    }

    #[tokio::test]
    async fn published_to_filters_by_exact_routing_key() {
        let bus = InMemoryBus::new();
        bus.publish("command", "pay", &serde_json::json!({"order_id": 1}))
            .await
            .unwrap();
        bus.publish("command", "check.delivery", &serde_json::json!({"order_id": 1}))
            .await
            .unwrap();

        assert_eq!(bus.published_to("pay").len(), 1);
        assert_eq!(bus.published_to("check.delivery").len(), 1);
        assert_eq!(bus.published_to("return.money").len(), 0);
    }
}
