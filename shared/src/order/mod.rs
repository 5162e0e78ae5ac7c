//! Order types
//!
//! - `model`: the `Order` record and its normalizing constructor
//! - `types`: status enums, line items, delivery snapshot, payment details
//! - `history`: status history dedup and merge
//! - `money`: decimal-backed amount helpers

pub mod history;
pub mod model;
pub mod money;
pub mod types;

// Re-exports
pub use history::{dedup_history, merge_histories, record_status};
pub use model::{Order, OrderValidationError};
pub use types::*;
