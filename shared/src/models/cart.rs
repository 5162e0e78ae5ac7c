//! Cart Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::order::{LineItem, money};

/// Cart line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub product_id: u64,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub selected_attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl CartItem {
    /// Same product with the same attribute selection
    pub fn same_line(&self, product_id: u64, attributes: &BTreeMap<String, String>) -> bool {
        self.product_id == product_id && &self.selected_attributes == attributes
    }

    pub fn to_line_item(&self) -> LineItem {
        LineItem {
            product_id: self.product_id,
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            selected_attributes: self.selected_attributes.clone(),
            images: self.images.clone(),
        }
    }
}

/// Shopping cart (购物车)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units
    pub fn count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn subtotal(&self) -> f64 {
        money::sum_lines(self.items.iter().map(|i| (i.unit_price, i.quantity)))
    }

    /// Add a line, merging quantities with an identical line.
    ///
    /// Zero quantities are ignored.
    pub fn add(&mut self, item: CartItem) {
        if item.quantity == 0 {
            return;
        }
        match self
            .items
            .iter_mut()
            .find(|i| i.same_line(item.product_id, &item.selected_attributes))
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
                existing.unit_price = item.unit_price;
            }
            None => self.items.push(item),
        }
    }

    /// Set a line's quantity; zero removes it. Returns false if the line is absent.
    pub fn set_quantity(
        &mut self,
        product_id: u64,
        attributes: &BTreeMap<String, String>,
        quantity: u32,
    ) -> bool {
        let Some(idx) = self
            .items
            .iter()
            .position(|i| i.same_line(product_id, attributes))
        else {
            return false;
        };
        if quantity == 0 {
            self.items.remove(idx);
        } else {
            self.items[idx].quantity = quantity;
        }
        true
    }

    /// Remove a line; returns false if it was absent
    pub fn remove(&mut self, product_id: u64, attributes: &BTreeMap<String, String>) -> bool {
        self.set_quantity(product_id, attributes, 0)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Snapshot the lines for an order
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items.iter().map(CartItem::to_line_item).collect()
    }
}
