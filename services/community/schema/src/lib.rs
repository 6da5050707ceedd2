//! sea-orm entities for the community service.

pub mod claim_tokens;
pub mod events;
pub mod invites;
pub mod people;
pub mod users;
