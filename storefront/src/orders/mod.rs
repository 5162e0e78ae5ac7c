//! Order lifecycle and remote synchronization
//!
//! - **manager**: [`OrdersManager`] owns the signed-in user's orders
//! - **fees**: delivery fee schedule applied at checkout
//! - **merge**: folding pulled remote orders into the local list
//! - **sync**: [`SyncService`] pushes, pulls and propagates status changes
//!
//! # Architecture
//!
//! ```text
//! Cart ──create_order──→ OrdersManager ──save──→ RecordStorage (redb)
//!                             │   ↑
//!                   broadcast │   │ attach_remote_id / merge_remote
//!                             ↓   │
//!                        SyncService ←──→ OrderRemote (HTTP)
//! ```

pub mod fees;
pub mod manager;
pub mod merge;
pub mod sync;

pub use fees::FeeSchedule;
pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use merge::{MergeSummary, merge_orders};
pub use sync::{SyncError, SyncReport, SyncResult, SyncService};
