//! Docstore API crate.
//!
//! HTTP shell over the workflow core: request validation, token-gated
//! transfer endpoints, approval actions, and the wiring (state, routes,
//! server startup). Exposed as a library so integration tests can drive
//! the services against the in-memory store.

pub mod error;
pub mod handlers;
pub mod policy;
pub mod services;
pub mod setup;
pub mod state;
