//! Event bus for executor events.
//!
//! Provides an `EventBus` that distributes `ExecutorEvent` messages to all
//! subscribers via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::EventBus;
