//! Topic-routed message bus adapter (spec §4 item 1).

pub mod bus;
pub mod error;
pub mod in_memory;
pub mod lapin_bus;
pub mod logger;
pub mod message;
pub mod routing;

pub use bus::{MessageBus, MessageHandler};
pub use error::BusError;
pub use in_memory::InMemoryBus;
pub use lapin_bus::LapinBus;
pub use logger::{LogPublisher, Severity};
pub use message::IncomingMessage;
