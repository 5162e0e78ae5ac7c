//! Woo Client - REST client for the remote commerce platform
//!
//! Every call is signed with one-legged OAuth1 (HMAC-SHA1) query parameters.
//! Missing credentials fail only the individual call.

pub mod config;
pub mod customers;
pub mod error;
pub mod http;
pub mod mapping;
pub mod oauth;
pub mod orders;
pub mod types;

pub use config::WooConfig;
pub use customers::{CustomerRemote, WooCustomers};
pub use error::{ClientError, ClientResult};
pub use http::WooClient;
pub use orders::{OrderRemote, PulledOrders, WooOrders};
