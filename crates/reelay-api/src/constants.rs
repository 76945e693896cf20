//! API constants
//!
//! All endpoints are versioned under [`API_PREFIX`].

/// API path prefix for all routes.
pub const API_PREFIX: &str = "/api/v0";
