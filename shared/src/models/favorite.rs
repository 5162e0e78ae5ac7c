//! Favorite Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Favorited product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Favorite {
    pub product_id: u64,
    pub name: String,
    pub added_at: DateTime<Utc>,
}

/// Favorites list, at most one entry per product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Favorites {
    #[serde(default)]
    pub items: Vec<Favorite>,
}

impl Favorites {
    pub fn contains(&self, product_id: u64) -> bool {
        self.items.iter().any(|f| f.product_id == product_id)
    }

    /// Add if absent, remove if present. Returns true when now favorited.
    pub fn toggle(&mut self, product_id: u64, name: &str, at: DateTime<Utc>) -> bool {
        if self.remove(product_id) {
            return false;
        }
        self.items.push(Favorite {
            product_id,
            name: name.to_string(),
            added_at: at,
        });
        true
    }

    pub fn remove(&mut self, product_id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|f| f.product_id != product_id);
        self.items.len() != before
    }
}
