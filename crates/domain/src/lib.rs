//! Order record, phase-status model, and status normalizer shared by the
//! repository, saga, and facade crates.

pub mod cancel_saga;
pub mod error;
pub mod normalizer;
pub mod order;
pub mod status;

pub use cancel_saga::CancellationSagaRecord;
pub use error::OrderError;
pub use normalizer::normalize;
pub use order::Order;
pub use status::{
    CancellationSagaState, CreationStatus, DeliveryStatus, FabricationStatus, ParseStatusError,
};
