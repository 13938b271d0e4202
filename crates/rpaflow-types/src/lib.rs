//! Shared domain types for rpaflow.
//!
//! This crate contains the types used across the workflow engine: workflow
//! definitions, typed action payloads, execution records, engine events,
//! configuration, and the associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod action;
pub mod config;
pub mod error;
pub mod event;
pub mod execution;
pub mod workflow;
