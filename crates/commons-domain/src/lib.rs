//! Domain types shared across Commons crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod email;
pub mod id;
pub mod pagination;
pub mod sync;
pub mod user;
