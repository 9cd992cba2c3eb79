//! # Skincare matching server
//!
//! The HTTP surface over the matching engine. It is responsible for:
//! * Accepting match requests on `POST /api/products/match` and handing them to the engine.
//! * Formatting engine results into the response wire format (display prices, availability
//!   strings, verification timestamps).
//! * Liveness (`GET /health`) and service diagnostics (`GET /api/products/health`).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
