//! Session types shared across Commons crates.
//!
//! Provides JWT validation (and issuance behind the `issuer` feature),
//! session cookie builders, and the `Identity`/`AdminIdentity` extractors.

pub mod cookie;
pub mod identity;
pub mod token;
