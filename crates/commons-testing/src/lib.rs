//! Test utilities for Commons services.
//!
//! Provides `MockAuth` session cookies and an event-stream frame parser.
//! Import in `#[cfg(test)]` blocks and `tests/` only, never in production code.

pub mod auth;
pub mod sse;
