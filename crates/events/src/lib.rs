//! In-process broker event bus.

pub mod bus;

pub use bus::{BrokerEvent, EventBus};
