//! Value types carried by an order

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::OrderValidationError;

// ============================================================================
// Status Enums
// ============================================================================

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Terminal statuses accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer pays
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Not chosen yet
    #[default]
    Pending,
    /// Cash on delivery
    Cod,
    /// Online payment provider
    Online,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Pending => "pending",
            PaymentMethod::Cod => "cod",
            PaymentMethod::Online => "online",
        }
    }
}

/// Payment state of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Parse the lowercase wire name
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// Delivery speed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryTime {
    #[default]
    Standard,
    Express,
}

impl DeliveryTime {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryTime::Standard => "standard",
            DeliveryTime::Express => "express",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(DeliveryTime::Standard),
            "express" => Some(DeliveryTime::Express),
            _ => None,
        }
    }
}

// ============================================================================
// Line Items
// ============================================================================

/// One purchased product line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Remote platform product id
    pub product_id: u64,
    /// Product name snapshot
    pub name: String,
    /// Quantity (>= 1)
    pub quantity: u32,
    /// Unit price in currency unit
    pub unit_price: f64,
    /// Selected attributes (e.g. "Weight" -> "500g")
    #[serde(default)]
    pub selected_attributes: BTreeMap<String, String>,
    /// Product image URLs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl LineItem {
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.quantity == 0 {
            return Err(OrderValidationError::InvalidQuantity {
                product_id: self.product_id,
            });
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(OrderValidationError::InvalidAmount {
                field: "unit_price",
                value: self.unit_price,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Destination snapshot copied into the order at creation time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeliveryDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub delivery_time: DeliveryTime,
}

impl DeliveryDetails {
    /// Required fields must be non-blank
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(OrderValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Payment / History
// ============================================================================

/// Details reported by a payment flow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PaymentDetails {
    /// Provider-reported status (only `paid` is acted upon)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    /// Provider transaction id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl PaymentDetails {
    pub fn paid(transaction_id: impl Into<String>) -> Self {
        Self {
            status: Some(PaymentStatus::Paid),
            transaction_id: Some(transaction_id.into()),
        }
    }

    pub fn with_transaction(transaction_id: impl Into<String>) -> Self {
        Self {
            status: None,
            transaction_id: Some(transaction_id.into()),
        }
    }

    /// Transaction id, ignoring blank strings
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// One status transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

impl StatusEntry {
    pub fn new(status: OrderStatus, timestamp: DateTime<Utc>) -> Self {
        Self { status, timestamp }
    }
}
