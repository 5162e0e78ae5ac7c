//! Shared types for the storefront workspace
//!
//! Domain types used by both the order store (`storefront`) and the
//! remote platform client (`woo-client`): orders and their status history,
//! cart, favorites, profile/addresses, customer snapshots, error codes and
//! small time/id utilities.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use error::ErrorCode;
pub use serde::{Deserialize, Serialize};
