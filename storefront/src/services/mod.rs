//! 服务层 - 购物车、收藏、用户资料与会话
//!
//! # 服务列表
//!
//! - [`CartManager`] - 购物车 (游客可用)
//! - [`FavoritesManager`] - 收藏
//! - [`ProfileManager`] - 用户资料与地址簿
//! - [`SessionHandle`] - 当前登录会话
//! - [`Notifier`] - 用户提示广播
//!
//! Every service keeps its state in memory and writes it through to
//! [`RecordStorage`](crate::storage::RecordStorage) after each mutation.

pub mod cart;
pub mod favorites;
pub mod notice;
pub mod profile;
pub mod session;

pub use cart::CartManager;
pub use favorites::FavoritesManager;
pub use notice::{Notice, NoticeLevel, Notifier};
pub use profile::ProfileManager;
pub use session::{GUEST_OWNER, Session, SessionHandle};

use crate::storage::StorageError;
use shared::ErrorCode;
use thiserror::Error;

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Address not found: {0}")]
    AddressNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Storage(_) => ErrorCode::StorageError,
            ServiceError::NotSignedIn => ErrorCode::NotAuthenticated,
            ServiceError::AddressNotFound(_) => ErrorCode::NotFound,
            ServiceError::Validation(_) => ErrorCode::ValidationFailed,
        }
    }

    /// Publish as a user-facing notice
    pub(crate) fn report(&self, notifier: &Notifier) {
        match self {
            ServiceError::Storage(e) => {
                tracing::error!(error = %e, "Service storage error");
                notifier.error(self.code(), self.code().default_message());
            }
            _ => notifier.error(self.code(), self.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
