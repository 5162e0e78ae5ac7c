//! Order record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::history::{dedup_history, record_status};
use super::money;
use super::types::{
    DeliveryDetails, LineItem, OrderStatus, PaymentMethod, PaymentStatus, StatusEntry,
};

/// Reasons an order record is rejected at an ingestion point
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Order has no items")]
    NoItems,

    #[error("Invalid quantity for product {product_id}")]
    InvalidQuantity { product_id: u64 },

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: &'static str, value: f64 },
}

/// One purchase transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Locally generated id, stable once created
    pub id: String,
    /// Remote platform order id, set once synced
    #[serde(default)]
    pub remote_id: Option<u64>,
    /// Owner
    pub user_id: String,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Sum of line totals
    pub total: f64,
    #[serde(default)]
    pub delivery_fee: f64,
    #[serde(default)]
    pub discount: f64,
    /// Destination snapshot (never linked to a profile address)
    pub delivery: DeliveryDetails,
    #[serde(default)]
    pub status_history: Vec<StatusEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when an online payment provider confirms the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl Order {
    /// Build a fresh `pending` order from checkout input.
    ///
    /// `total` is computed from the lines; history starts with one
    /// `pending` entry.
    pub fn place(
        id: impl Into<String>,
        user_id: impl Into<String>,
        items: Vec<LineItem>,
        delivery: DeliveryDetails,
        delivery_fee: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderValidationError> {
        delivery.validate()?;
        let total = money::sum_lines(items.iter().map(|i| (i.unit_price, i.quantity)));
        Order {
            id: id.into(),
            remote_id: None,
            user_id: user_id.into(),
            items,
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Pending,
            payment_status: PaymentStatus::Unpaid,
            total,
            delivery_fee,
            discount: 0.0,
            delivery,
            status_history: vec![StatusEntry::new(OrderStatus::Pending, now)],
            created_at: now,
            updated_at: now,
            transaction_id: None,
        }
        .normalize()
    }

    /// Single normalizing constructor applied at every ingestion point
    /// (creation, remote pull, storage load).
    ///
    /// Rejects malformed records instead of defaulting them, collapses the
    /// status history, and makes sure the current status is present in it.
    pub fn normalize(mut self) -> Result<Self, OrderValidationError> {
        if self.id.trim().is_empty() {
            return Err(OrderValidationError::MissingField("id"));
        }
        if self.items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        for item in &self.items {
            item.validate()?;
        }
        for (field, value) in [
            ("total", self.total),
            ("delivery_fee", self.delivery_fee),
            ("discount", self.discount),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OrderValidationError::InvalidAmount { field, value });
            }
        }

        if self.updated_at < self.created_at {
            self.updated_at = self.created_at;
        }

        self.status_history = dedup_history(&self.status_history);
        if self.status_history.is_empty() {
            self.status_history
                .push(StatusEntry::new(self.status, self.created_at));
        } else if !self.status_history.iter().any(|e| e.status == self.status) {
            record_status(&mut self.status_history, self.status, self.updated_at);
        }

        self.transaction_id = self
            .transaction_id
            .take()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(self)
    }

    /// `total + delivery_fee - discount`
    pub fn grand_total(&self) -> f64 {
        money::grand_total(self.total, self.delivery_fee, self.discount)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_synced(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Move to `status`, recording a deduplicated history entry
    pub fn transition(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        record_status(&mut self.status_history, status, at);
        self.touch(at);
    }

    /// Bump `updated_at`
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}
