//! Phase-status enumerations for the order record.
//!
//! An order carries three independent phase statuses (creation,
//! fabrication, delivery), each advanced by a distinct external process.
//! See spec §3.

use serde::{Deserialize, Serialize};

/// Status of the creation phase, driven by the confirmation saga.
///
/// Transitions:
/// ```text
/// Pending ──┬──► Paid ──┬──► Confirmed
///           │           └──► NotDeliverable ──► Returned
///           └──► NoMoney
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CreationStatus {
    #[default]
    Pending,
    Paid,
    Confirmed,
    NoMoney,
    NotDeliverable,
    Returned,
}

impl CreationStatus {
    /// Terminal creation statuses; the confirmation saga never transitions
    /// out of these (spec §4.4).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CreationStatus::Confirmed | CreationStatus::NoMoney | CreationStatus::Returned
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CreationStatus::Pending => "Pending",
            CreationStatus::Paid => "Paid",
            CreationStatus::Confirmed => "Confirmed",
            CreationStatus::NoMoney => "NoMoney",
            CreationStatus::NotDeliverable => "NotDeliverable",
            CreationStatus::Returned => "Returned",
        }
    }
}

impl std::fmt::Display for CreationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CreationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(CreationStatus::Pending),
            "Paid" => Ok(CreationStatus::Paid),
            "Confirmed" => Ok(CreationStatus::Confirmed),
            "NoMoney" => Ok(CreationStatus::NoMoney),
            "NotDeliverable" => Ok(CreationStatus::NotDeliverable),
            "Returned" => Ok(CreationStatus::Returned),
            other => Err(ParseStatusError::unknown("CreationStatus", other)),
        }
    }
}

/// Status of the fabrication phase, driven by Warehouse and (optionally)
/// the cancellation saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FabricationStatus {
    #[default]
    NotStarted,
    Requested,
    InProgress,
    Completed,
    Failed,
    Canceling,
    Canceled,
    CancelPendingRefund,
}

impl FabricationStatus {
    /// Once in a terminal status the fabrication phase is closed: further
    /// Warehouse events are ignored for advancement (spec §3).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FabricationStatus::Canceled
                | FabricationStatus::CancelPendingRefund
                | FabricationStatus::Failed
                | FabricationStatus::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FabricationStatus::NotStarted => "NotStarted",
            FabricationStatus::Requested => "Requested",
            FabricationStatus::InProgress => "InProgress",
            FabricationStatus::Completed => "Completed",
            FabricationStatus::Failed => "Failed",
            FabricationStatus::Canceling => "Canceling",
            FabricationStatus::Canceled => "Canceled",
            FabricationStatus::CancelPendingRefund => "CancelPendingRefund",
        }
    }
}

impl std::fmt::Display for FabricationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FabricationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotStarted" => Ok(FabricationStatus::NotStarted),
            "Requested" => Ok(FabricationStatus::Requested),
            "InProgress" => Ok(FabricationStatus::InProgress),
            "Completed" => Ok(FabricationStatus::Completed),
            "Failed" => Ok(FabricationStatus::Failed),
            "Canceling" => Ok(FabricationStatus::Canceling),
            "Canceled" => Ok(FabricationStatus::Canceled),
            "CancelPendingRefund" => Ok(FabricationStatus::CancelPendingRefund),
            other => Err(ParseStatusError::unknown("FabricationStatus", other)),
        }
    }
}

/// Status of the delivery phase, driven by Delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryStatus {
    #[default]
    NotStarted,
    Ready,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::NotStarted => "NotStarted",
            DeliveryStatus::Ready => "Ready",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotStarted" => Ok(DeliveryStatus::NotStarted),
            "Ready" => Ok(DeliveryStatus::Ready),
            "Delivered" => Ok(DeliveryStatus::Delivered),
            "Failed" => Ok(DeliveryStatus::Failed),
            other => Err(ParseStatusError::unknown("DeliveryStatus", other)),
        }
    }
}

/// State of a cancellation-saga record (spec §3, §4.5).
///
/// ```text
/// Canceling ──► Refunding ──┬──► Canceled
///                           └──► CancelPendingRefund
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancellationSagaState {
    Canceling,
    Refunding,
    Canceled,
    CancelPendingRefund,
}

impl CancellationSagaState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CancellationSagaState::Canceled | CancellationSagaState::CancelPendingRefund
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationSagaState::Canceling => "Canceling",
            CancellationSagaState::Refunding => "Refunding",
            CancellationSagaState::Canceled => "Canceled",
            CancellationSagaState::CancelPendingRefund => "CancelPendingRefund",
        }
    }
}

impl std::fmt::Display for CancellationSagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CancellationSagaState {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Canceling" => Ok(CancellationSagaState::Canceling),
            "Refunding" => Ok(CancellationSagaState::Refunding),
            "Canceled" => Ok(CancellationSagaState::Canceled),
            "CancelPendingRefund" => Ok(CancellationSagaState::CancelPendingRefund),
            other => Err(ParseStatusError::unknown("CancellationSagaState", other)),
        }
    }
}

/// Raised when a persisted status string no longer matches any known
/// variant, e.g. after a column holds a value written by a future version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {type_name} value: {value:?}")]
pub struct ParseStatusError {
    type_name: &'static str,
    value: String,
}

impl ParseStatusError {
    fn unknown(type_name: &'static str, value: &str) -> Self {
        Self {
            type_name,
            value: value.to_string(),
        }
    }
}
