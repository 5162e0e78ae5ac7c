//! Remote platform schema
//!
//! Explicit types for the subset of the REST API that is used. Unknown
//! status strings and missing required fields fail deserialization instead
//! of being defaulted; money arrives as decimal strings and is parsed in
//! [`crate::mapping`].

use serde::{Deserialize, Serialize};

// ============================================================================
// Status
// ============================================================================

/// Remote order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteStatus {
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
    CheckoutDraft,
}

impl RemoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteStatus::Pending => "pending",
            RemoteStatus::Processing => "processing",
            RemoteStatus::OnHold => "on-hold",
            RemoteStatus::Completed => "completed",
            RemoteStatus::Cancelled => "cancelled",
            RemoteStatus::Refunded => "refunded",
            RemoteStatus::Failed => "failed",
            RemoteStatus::CheckoutDraft => "checkout-draft",
        }
    }
}

// ============================================================================
// Shared Blocks
// ============================================================================

/// Opaque metadata entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub key: String,
    pub value: serde_json::Value,
}

impl RemoteMeta {
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            key: key.into(),
            value: serde_json::Value::String(value.into()),
        }
    }

    /// String value (numbers are rendered, other shapes are `None`)
    pub fn as_text(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Find a metadata value by key
pub fn meta_value(meta: &[RemoteMeta], key: &str) -> Option<String> {
    meta.iter().find(|m| m.key == key).and_then(RemoteMeta::as_text)
}

/// Billing / shipping address block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RemoteAddress {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub address_2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
}

/// Shipping line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteShippingLine {
    pub method_id: String,
    #[serde(default)]
    pub method_title: String,
    #[serde(default)]
    pub total: String,
}

/// Fee line (used for the order discount)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteFeeLine {
    pub name: String,
    pub total: String,
}

// ============================================================================
// Orders (response)
// ============================================================================

/// Line item as returned by the remote platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteLineItem {
    #[serde(default)]
    pub id: Option<u64>,
    pub product_id: u64,
    pub name: String,
    pub quantity: u32,
    /// Line subtotal before discounts
    pub subtotal: String,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub meta_data: Vec<RemoteMeta>,
}

/// Order as returned by the remote platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteOrder {
    pub id: u64,
    pub status: RemoteStatus,
    #[serde(default)]
    pub customer_id: u64,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub payment_method_title: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub shipping_total: String,
    #[serde(default)]
    pub discount_total: String,
    #[serde(default)]
    pub customer_note: String,
    pub date_created_gmt: Option<String>,
    #[serde(default)]
    pub date_modified_gmt: Option<String>,
    #[serde(default)]
    pub billing: RemoteAddress,
    #[serde(default)]
    pub shipping: RemoteAddress,
    pub line_items: Vec<RemoteLineItem>,
    #[serde(default)]
    pub shipping_lines: Vec<RemoteShippingLine>,
    #[serde(default)]
    pub fee_lines: Vec<RemoteFeeLine>,
    #[serde(default)]
    pub meta_data: Vec<RemoteMeta>,
}

// ============================================================================
// Orders (request)
// ============================================================================

/// Line item sent when creating an order
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RemoteLineItemPayload {
    pub product_id: u64,
    pub name: String,
    pub quantity: u32,
    pub subtotal: String,
    pub total: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meta_data: Vec<RemoteMeta>,
}

/// Create-order payload
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RemoteOrderPayload {
    pub status: RemoteStatus,
    pub customer_id: u64,
    pub payment_method: String,
    pub payment_method_title: String,
    pub set_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub customer_note: String,
    pub billing: RemoteAddress,
    pub shipping: RemoteAddress,
    pub line_items: Vec<RemoteLineItemPayload>,
    pub shipping_lines: Vec<RemoteShippingLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fee_lines: Vec<RemoteFeeLine>,
    pub meta_data: Vec<RemoteMeta>,
}

/// Status update payload
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RemoteStatusUpdate {
    pub status: RemoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_paid: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meta_data: Vec<RemoteMeta>,
}

// ============================================================================
// Customers
// ============================================================================

/// Customer as returned by the remote platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteCustomer {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub billing: RemoteAddress,
}

/// Create-customer payload
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RemoteCustomerPayload {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub billing: RemoteAddress,
}
