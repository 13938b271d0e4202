//! Workflow engine, action handlers, and capability traits for rpaflow.
//!
//! This crate defines the capability "ports" (browser, HTTP, process,
//! filesystem) that the infrastructure layer implements, and the engine that
//! drives workflows against them. It depends only on `rpaflow-types` -- never
//! on `rpaflow-infra` or any network/OS binding.

pub mod action;
pub mod capability;
pub mod engine;
pub mod event;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use engine::{Engine, EngineError, RunRequest, RunTicket};
pub use event::EventBus;
