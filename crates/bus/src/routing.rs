//! Central table of routing keys (spec §6).
//!
//! Call sites never spell out a topic inline; they reference one of these
//! constants, the way the reference workspace names its saga steps in
//! `order_fulfillment::STEP_*`.

/// Legacy; updates `creation_status` only, never drives a saga transition.
pub const PAYMENT_PAID: &str = "payment.paid";
/// Legacy; updates `creation_status` only, never drives a saga transition.
pub const PAYMENT_FAILED: &str = "payment.failed";
/// `{order_id, status: paid|not_paid}`.
pub const PAYMENT_RESULT: &str = "payment.result";

/// `{order_id, status: deliverable|not_deliverable}`.
pub const DELIVERY_RESULT: &str = "delivery.result";
/// `{order_id, status}`; also bound as [`DELIVERY_READY`] in an older revision.
pub const DELIVERY_FINISHED: &str = "delivery.finished";
/// Synonym for [`DELIVERY_FINISHED`], bound to the same handler.
pub const DELIVERY_READY: &str = "delivery.ready";

/// `{order_id}`.
pub const MONEY_RETURNED: &str = "money.returned";

/// `{status}`.
pub const AUTH_RUNNING: &str = "auth.running";
/// `{status}`.
pub const AUTH_NOT_RUNNING: &str = "auth.not_running";

/// Default binding pattern for fabrication-progress events (spec §4.6).
/// Overridable via `WAREHOUSE_EVENTS_BINDING`.
pub const WAREHOUSE_EVENTS_DEFAULT_BINDING: &str = "warehouse.#";

/// `{saga_id, order_id}`.
pub const EVT_FABRICATION_CANCELED: &str = "evt.fabrication_canceled";

/// `{saga_id, status: refunded|.., reason?}`; aliases [`REFUND_REFUNDED`] and
/// [`REFUND_FAILED`].
pub const REFUND_RESULT: &str = "refund.result";
/// Synonym for [`REFUND_RESULT`].
pub const REFUND_REFUNDED: &str = "evt_refunded";
/// Synonym for [`REFUND_RESULT`].
pub const REFUND_FAILED: &str = "evt_refund_failed";

/// Confirmation saga: Pending's entry effect.
pub const CMD_PAY: &str = "pay";
/// Confirmation saga: Paid's entry effect.
pub const CMD_CHECK_DELIVERY: &str = "check.delivery";
/// Confirmation saga: NotDeliverable's entry effect.
pub const CMD_RETURN_MONEY: &str = "return.money";

/// Cancellation saga: Canceling's entry effect.
pub const CMD_CANCEL_FABRICATION: &str = "cmd.cancel_fabrication";
/// Cancellation saga: Refunding's entry effect.
pub const CMD_REFUND: &str = "cmd.refund";

/// Confirmation saga: Confirmed's entry effect, full order payload for Warehouse.
pub const WAREHOUSE_ORDER: &str = "warehouse.order";
/// Legacy synonym for [`WAREHOUSE_ORDER`], still accepted as a fabrication trigger.
pub const ORDER_CREATED: &str = "order.created";
/// Published when fabrication completes (spec §4.6 step 6); consumed by Delivery.
pub const ORDER_FABRICATED: &str = "order.fabricated";

/// Structured log severities, suffixed onto the `order.*` log routing keys.
pub const LOG_INFO: &str = "order.info";
pub const LOG_DEBUG: &str = "order.debug";
pub const LOG_ERROR: &str = "order.error";

/// The three logical exchanges declared over the underlying topic exchange
/// (spec §4 item 1).
pub mod exchange {
    /// General events exchange (payment/delivery/warehouse/auth notifications).
    pub const EVENTS: &str = "events";
    /// Orchestrator → workers.
    pub const COMMAND: &str = "command";
    /// Workers → orchestrator saga results.
    pub const SAGA: &str = "saga";
    /// Structured audit records.
    pub const LOGS: &str = "logs";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_synonyms_are_distinct_strings() {
        assert_ne!(DELIVERY_FINISHED, DELIVERY_READY);
    }

    #[test]
    fn refund_result_has_two_legacy_aliases() {
        assert_ne!(REFUND_RESULT, REFUND_REFUNDED);
        assert_ne!(REFUND_RESULT, REFUND_FAILED);
    }
}
