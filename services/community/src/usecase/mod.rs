pub mod claim;
pub mod invite;
pub mod people;
pub mod session;
pub mod stats;
pub mod suggestion;
pub mod sync;
