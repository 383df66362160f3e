//! The persisted record backing the cancellation saga (spec §4.5).

use common::{OrderId, SagaId};
use serde::{Deserialize, Serialize};

use crate::status::CancellationSagaState;

/// One row per in-flight or completed order cancellation.
///
/// Unlike [`crate::order::Order`] this record is owned entirely by the
/// cancellation saga: nothing outside `saga::cancellation` advances its
/// `state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationSagaRecord {
    pub saga_id: SagaId,
    pub order_id: OrderId,
    pub state: CancellationSagaState,
    /// Set when the saga lands in `CancelPendingRefund`, carrying the
    /// reason an operator needs to reconcile the refund by hand.
    pub error: Option<String>,
}

impl CancellationSagaRecord {
    pub fn new(saga_id: SagaId, order_id: OrderId) -> Self {
        Self {
            saga_id,
            order_id,
            state: CancellationSagaState::Canceling,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_starts_canceling_with_no_error() {
        let record = CancellationSagaRecord::new(SagaId::new(), OrderId::new(1));
        assert_eq!(record.state, CancellationSagaState::Canceling);
        assert!(record.error.is_none());
        assert!(!record.is_terminal());
    }

    #[test]
    fn terminal_states_are_reported() {
        let mut record = CancellationSagaRecord::new(SagaId::new(), OrderId::new(1));
        record.state = CancellationSagaState::Canceled;
        assert!(record.is_terminal());

        record.state = CancellationSagaState::CancelPendingRefund;
        record.error = Some("refund service unreachable".into());
        assert!(record.is_terminal());
    }
}
