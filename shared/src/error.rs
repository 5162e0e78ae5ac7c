//! Error codes shared across the workspace
//!
//! Codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Session errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 7xxx: Remote platform errors
//! - 9xxx: System errors
//!
//! Notices shown to the user carry one of these codes so the caller can
//! localize the message without parsing text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Session ====================
    /// No user is signed in
    NotAuthenticated = 1001,
    /// Signed-in user changed while a request was in flight
    SessionChanged = 1002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Cart is empty
    CartEmpty = 4002,
    /// Transition not allowed from the current status
    InvalidTransition = 4003,
    /// Order is in a terminal status
    OrderClosed = 4004,

    // ==================== 5xxx: Payment ====================
    /// Payment could not be recorded
    PaymentRejected = 5001,

    // ==================== 7xxx: Remote ====================
    /// Remote platform unreachable or returned an error
    RemoteUnavailable = 7001,
    /// Remote platform credentials are missing
    RemoteNotConfigured = 7002,
    /// No remote customer is linked to the session
    RemoteCustomerMissing = 7003,

    // ==================== 9xxx: System ====================
    /// Durable storage failure
    StorageError = 9001,
    /// Internal error
    InternalError = 9999,
}

impl ErrorCode {
    /// Numeric value of the code
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Display code (`E4003` style)
    pub fn code(self) -> String {
        format!("E{:04}", self.value())
    }

    /// Default English message
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::RequiredField => "Required field missing",
            Self::NotAuthenticated => "Please sign in first",
            Self::SessionChanged => "Account changed, please try again",
            Self::OrderNotFound => "Order not found",
            Self::CartEmpty => "Your cart is empty",
            Self::InvalidTransition => "This order can no longer be changed that way",
            Self::OrderClosed => "This order is already closed",
            Self::PaymentRejected => "Payment could not be recorded",
            Self::RemoteUnavailable => "Store server is unavailable",
            Self::RemoteNotConfigured => "Store server is not configured",
            Self::RemoteCustomerMissing => "Customer account is not linked",
            Self::StorageError => "Could not save your data",
            Self::InternalError => "Internal error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.value()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            7 => Self::RequiredField,
            1001 => Self::NotAuthenticated,
            1002 => Self::SessionChanged,
            4001 => Self::OrderNotFound,
            4002 => Self::CartEmpty,
            4003 => Self::InvalidTransition,
            4004 => Self::OrderClosed,
            5001 => Self::PaymentRejected,
            7001 => Self::RemoteUnavailable,
            7002 => Self::RemoteNotConfigured,
            7003 => Self::RemoteCustomerMissing,
            9001 => Self::StorageError,
            9999 => Self::InternalError,
            other => return Err(format!("Unknown error code: {}", other)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
