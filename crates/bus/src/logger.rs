use std::sync::Arc;

use serde_json::json;
use tracing::error;

use crate::bus::MessageBus;
use crate::routing::{LOG_DEBUG, LOG_ERROR, LOG_INFO, exchange};

/// Severity of a structured audit record (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Debug,
    Error,
}

impl Severity {
    fn routing_key(self) -> &'static str {
        match self {
            Severity::Info => LOG_INFO,
            Severity::Debug => LOG_DEBUG,
            Severity::Error => LOG_ERROR,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Error => "error",
        }
    }
}

/// Best-effort structured logger over the `logs` exchange.
///
/// A publish failure never propagates to the caller: it falls back to a
/// local `tracing::error!` call so the orchestrator's own control flow
/// never depends on the logging sink being reachable (spec §7
/// `LoggingFailure`).
pub struct LogPublisher {
    bus: Arc<dyn MessageBus>,
}

impl LogPublisher {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self { bus }
    }

    pub async fn log(&self, severity: Severity, message: &str, fields: serde_json::Value) {
        let record = json!({
            "measurement": "logs",
            "service": "order",
            "severity": severity.as_str(),
            "message": message,
            "fields": fields,
        });

        if let Err(err) = self
            .bus
            .publish(exchange::LOGS, severity.routing_key(), &record)
            .await
        {
            error!(%err, %message, "failed to publish structured log, falling back to local log");
        }
    }

    pub async fn info(&self, message: &str, fields: serde_json::Value) {
        self.log(Severity::Info, message, fields).await;
    }

    pub async fn debug(&self, message: &str, fields: serde_json::Value) {
        self.log(Severity::Debug, message, fields).await;
    }

    pub async fn error(&self, message: &str, fields: serde_json::Value) {
        self.log(Severity::Error, message, fields).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryBus;

    #[tokio::test]
    async fn info_publishes_a_decorated_record_to_the_logs_exchange() {
        let bus = Arc::new(InMemoryBus::new());
        let logger = LogPublisher::new(bus.clone());

        logger.info("order created", json!({"order_id": 1})).await;

        let published = bus.published();
        assert_eq!(published.len(), 1);
        let (exchange, routing_key, payload) = &published[0];
        assert_eq!(exchange, "logs");
        assert_eq!(routing_key, LOG_INFO);
        assert_eq!(payload["severity"], "info");
        assert_eq!(payload["message"], "order created");
        assert_eq!(payload["fields"]["order_id"], 1);
    }
}
