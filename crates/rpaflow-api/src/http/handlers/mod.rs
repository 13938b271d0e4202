//! HTTP request handlers for all API endpoints.

pub mod execution;
pub mod ws;
