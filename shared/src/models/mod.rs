//! Data models
//!
//! Per-user records persisted by the storefront services and the customer
//! snapshot sent to the remote platform.

pub mod cart;
pub mod customer;
pub mod favorite;
pub mod profile;

// Re-exports
pub use cart::*;
pub use customer::*;
pub use favorite::*;
pub use profile::*;
