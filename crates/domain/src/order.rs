//! The order record (spec §3).

use common::{ClientId, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::status::{CreationStatus, DeliveryStatus, FabricationStatus};

/// A customer fabrication request.
///
/// `number_of_pieces` is derived from `pieces_a + pieces_b` and kept in
/// sync by the constructor; nothing else on this type is allowed to set it
/// independently (spec §3 invariant 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: ClientId,
    pub description: String,
    pub address: Option<String>,
    pub pieces_a: u32,
    pub pieces_b: u32,
    pub creation_status: CreationStatus,
    pub fabrication_status: FabricationStatus,
    pub delivery_status: DeliveryStatus,
    /// Last raw status string received from Warehouse, kept for operator
    /// diagnostics when an unrecognized status falls back to `InProgress`.
    /// Participates in no invariant and no saga transition.
    pub fabrication_status_raw: Option<String>,
}

impl Order {
    /// Builds a new order in its initial state.
    ///
    /// Rejects orders with zero total pieces (spec §3 invariant: `pieces_a +
    /// pieces_b >= 1` at creation). The repository assigns `id` on insert;
    /// callers construct with a placeholder id of `OrderId::new(0)` before
    /// persisting, the way the reference workspace builds an aggregate
    /// before it has been assigned a version.
    pub fn new(
        id: OrderId,
        client_id: ClientId,
        description: impl Into<String>,
        address: Option<String>,
        pieces_a: u32,
        pieces_b: u32,
    ) -> Result<Self, OrderError> {
        if pieces_a + pieces_b == 0 {
            return Err(OrderError::EmptyOrder);
        }

        Ok(Self {
            id,
            client_id,
            description: description.into(),
            address,
            pieces_a,
            pieces_b,
            creation_status: CreationStatus::default(),
            fabrication_status: FabricationStatus::default(),
            delivery_status: DeliveryStatus::default(),
            fabrication_status_raw: None,
        })
    }

    /// `pieces_a + pieces_b`, invariant across the order's lifetime.
    pub fn number_of_pieces(&self) -> u32 {
        self.pieces_a + self.pieces_b
    }

    /// The human-facing overall status (spec §4.2): delivery takes
    /// precedence over fabrication, which takes precedence over creation.
    pub fn overall_status(&self) -> String {
        if self.delivery_status != DeliveryStatus::NotStarted {
            format!("Delivery:{}", self.delivery_status)
        } else if self.fabrication_status != FabricationStatus::NotStarted {
            format!("Manufacturing:{}", self.fabrication_status)
        } else {
            format!("Creation:{}", self.creation_status)
        }
    }

    /// Whether fabrication may advance to `Requested` right now (spec §3
    /// invariant 2).
    pub fn can_request_fabrication(&self) -> bool {
        self.creation_status == CreationStatus::Confirmed
    }

    /// Whether delivery may leave `NotStarted` right now (spec §3).
    pub fn can_start_delivery(&self) -> bool {
        self.fabrication_status == FabricationStatus::Completed
    }

    /// Admission rule for the cancellation saga (spec §4.5, §8 invariant 6).
    pub fn can_be_cancelled(&self) -> bool {
        self.creation_status == CreationStatus::Confirmed
            && matches!(
                self.fabrication_status,
                FabricationStatus::Requested | FabricationStatus::InProgress
            )
    }
}
