//! Library crate for score-desk-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Storage backends and persisted models.
pub mod dao;
/// HTTP request and response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Score shapes and engines.
pub mod scoring;
/// Operations behind the routes.
pub mod services;
/// Shared application and session state.
pub mod state;
