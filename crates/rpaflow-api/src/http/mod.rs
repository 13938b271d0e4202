//! HTTP layer for rpaflow.
//!
//! Axum REST API at `/api/v1/` with the envelope response format, plus the
//! `/ws` executor event channel.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
