//! Confirmation and cancellation sagas, warehouse event ingress, the saga
//! registry, and the auth public-key cache.

pub mod auth;
pub mod cancellation;
pub mod confirmation;
pub mod error;
pub mod ingress;
pub mod registry;
pub mod warehouse;

pub use auth::{AuthKeyCache, AuthStatusIngress};
pub use cancellation::{CancellationEvent, CancellationSaga};
pub use confirmation::{ConfirmationEvent, ConfirmationSaga};
pub use error::SagaError;
pub use ingress::{
    DeliveryFinishedIngress, DeliveryResultIngress, FabricationCanceledIngress, LegacyPaymentIngress,
    MoneyReturnedIngress, PaymentResultIngress, RefundResultIngress,
};
pub use registry::SagaRegistry;
pub use warehouse::WarehouseIngress;
