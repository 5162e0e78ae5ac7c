use thiserror::Error;
use woo_client::ClientError;

use super::config::ConfigError;
use crate::orders::ManagerError;
use crate::services::ServiceError;
use crate::storage::StorageError;

/// Errors raised while opening or switching the store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Orders(#[from] ManagerError),

    #[error("远程平台错误: {0}")]
    Remote(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
