use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message read off a consumed queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub routing_key: String,
    pub payload: Value,
}

impl IncomingMessage {
    pub fn new(routing_key: impl Into<String>, payload: Value) -> Self {
        Self {
            routing_key: routing_key.into(),
            payload,
        }
    }
}

/// Matches a single routing key against a topic-exchange binding pattern.
///
/// Supports the subset of AMQP topic syntax this bus actually uses: exact
/// matches, and a trailing `#` that matches the rest of the key regardless
/// of segment count (e.g. `warehouse.#` matches `warehouse.progress` and
/// `warehouse.piece.completed`).
pub fn matches_binding(routing_key: &str, pattern: &str) -> bool {
    match pattern.strip_suffix(".#") {
        Some(prefix) => routing_key == prefix || routing_key.starts_with(&format!("{prefix}.")),
        None if pattern == "#" => true,
        None => routing_key == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_pattern_matches_only_itself() {
        assert!(matches_binding("payment.result", "payment.result"));
        assert!(!matches_binding("payment.result", "payment.paid"));
    }

    #[test]
    fn hash_suffix_matches_prefix_and_descendants() {
        assert!(matches_binding("warehouse.order", "warehouse.#"));
        assert!(matches_binding("warehouse.piece.completed", "warehouse.#"));
        assert!(matches_binding("warehouse", "warehouse.#"));
        assert!(!matches_binding("delivery.result", "warehouse.#"));
    }

    #[test]
    fn bare_hash_matches_everything() {
        assert!(matches_binding("anything.at.all", "#"));
    }
}
