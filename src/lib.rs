//! Bearer-token gate in front of a small todo API.
//!
//! Two verification strategies against an OpenID Connect provider:
//! local JWT signature validation with keys fetched once at startup, and
//! per-request token introspection.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
