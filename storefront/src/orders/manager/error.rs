use crate::storage::StorageError;
use shared::ErrorCode;
use shared::order::{OrderStatus, OrderValidationError};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] OrderValidationError),

    #[error("Not signed in")]
    NotSignedIn,

    /// A sync result arrived for a user who is no longer loaded
    #[error("Orders of {expected} are no longer loaded")]
    SessionChanged { expected: String },

    #[error("Cart is empty")]
    CartEmpty,

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Completed and cancelled orders accept no further changes
    #[error("Order {order_id} is already {status}")]
    OrderClosed {
        order_id: String,
        status: OrderStatus,
    },

    #[error("Cannot {action} order {order_id} while {status}")]
    InvalidTransition {
        order_id: String,
        status: OrderStatus,
        action: &'static str,
    },
}

impl ManagerError {
    /// 错误码（前端负责本地化）
    pub fn code(&self) -> ErrorCode {
        match self {
            ManagerError::Storage(_) => ErrorCode::StorageError,
            ManagerError::Validation(OrderValidationError::MissingField(_)) => {
                ErrorCode::RequiredField
            }
            ManagerError::Validation(_) => ErrorCode::ValidationFailed,
            ManagerError::NotSignedIn => ErrorCode::NotAuthenticated,
            ManagerError::SessionChanged { .. } => ErrorCode::SessionChanged,
            ManagerError::CartEmpty => ErrorCode::CartEmpty,
            ManagerError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            ManagerError::OrderClosed { .. } => ErrorCode::OrderClosed,
            ManagerError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
        }
    }

    /// Message shown to the user; storage details stay in the log
    pub fn user_message(&self) -> String {
        match self {
            ManagerError::Storage(e) => {
                tracing::error!(error = %e, "Storage error occurred");
                self.code().default_message().to_string()
            }
            _ => self.to_string(),
        }
    }

    /// 是否为状态冲突
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            ManagerError::OrderClosed { .. } | ManagerError::InvalidTransition { .. }
        )
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
