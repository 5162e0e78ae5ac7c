//! Storefront - 杂货店订单生命周期与远程同步
//!
//! # 架构概述
//!
//! - **存储** (`storage`): 嵌入式 redb，按用户保存订单、资料、购物车、收藏
//! - **服务** (`services`): 会话、购物车、收藏、资料、用户提示
//! - **订单** (`orders`): 下单、状态流转、远程合并与同步
//! - **核心** (`core`): 配置与服务组合 [`Storefront`]
//!
//! # 模块结构
//!
//! ```text
//! storefront/src/
//! ├── core/          # 配置、状态、错误
//! ├── services/      # 会话、购物车、收藏、资料、提示
//! ├── orders/        # 订单管理、运费、合并、同步
//! ├── storage.rs     # redb 记录存储
//! └── utils/         # 日志
//! ```

pub mod core;
pub mod orders;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export 公共类型
pub use core::{StoreConfig, StoreError, Storefront};
pub use orders::{FeeSchedule, ManagerError, OrdersManager, SyncError, SyncReport, SyncService};
pub use services::{Notice, NoticeLevel, Notifier, Session, SessionHandle};
pub use storage::{RecordKind, RecordStorage, StorageError};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env、读取配置、创建工作目录、初始化日志
pub fn setup_environment() -> anyhow::Result<StoreConfig> {
    dotenv::dotenv().ok();

    let config = StoreConfig::from_env()?;
    std::fs::create_dir_all(&config.work_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create work dir {}: {}", config.work_dir, e))?;

    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    Ok(config)
}
