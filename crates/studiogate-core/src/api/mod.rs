//! REST API client module.
//!
//! This module provides the `ApiClient`, which decorates every request with
//! the current bearer token and reacts globally to authorization failures by
//! clearing the session and sending the router back to the login page.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
