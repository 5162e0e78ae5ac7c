//! 核心模块 - 店面配置、状态和错误定义
//!
//! # 模块结构
//!
//! - [`StoreConfig`] - 店面配置
//! - [`Storefront`] - 服务组合 (会话、购物车、订单、同步)
//! - [`StoreError`] - 打开/切换店面时的错误

pub mod config;
pub mod error;
pub mod state;

pub use config::{ConfigError, StoreConfig};
pub use error::{Result, StoreError};
pub use state::Storefront;
