//! Profile Model
//!
//! Delivery addresses keep a single default: the first address added
//! becomes default, marking another address default clears the flag
//! elsewhere, and removing the default promotes the first remaining one.

use serde::{Deserialize, Serialize};

use crate::order::{DeliveryDetails, DeliveryTime};
use crate::util;

/// Address type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    #[default]
    Home,
    Work,
    Other,
}

/// Saved delivery address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub id: String,
    #[serde(rename = "type")]
    pub address_type: AddressType,
    pub full_address: String,
    #[serde(default)]
    pub area: String,
    pub city: String,
    pub phone_number: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Copy this address into an order delivery snapshot
    pub fn to_delivery(&self, name: &str, delivery_time: DeliveryTime) -> DeliveryDetails {
        let address = if self.area.trim().is_empty() {
            self.full_address.clone()
        } else {
            format!("{}, {}", self.full_address, self.area)
        };
        DeliveryDetails {
            name: name.to_string(),
            phone: self.phone_number.clone(),
            address,
            city: self.city.clone(),
            zip: String::new(),
            notes: String::new(),
            delivery_time,
        }
    }
}

/// Create address payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AddressCreate {
    #[serde(rename = "type", default)]
    pub address_type: AddressType,
    pub full_address: String,
    #[serde(default)]
    pub area: String,
    pub city: String,
    pub phone_number: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Update address payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AddressUpdate {
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    pub full_address: Option<String>,
    pub area: Option<String>,
    pub city: Option<String>,
    pub phone_number: Option<String>,
    pub is_default: Option<bool>,
}

/// User profile (用户资料)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Profile {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

/// Update profile payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Profile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Re-establish the single-default invariant (used after loading)
    pub fn normalized(mut self) -> Self {
        let preferred = self
            .addresses
            .iter()
            .find(|a| a.is_default)
            .map(|a| a.id.clone());
        self.settle_default(preferred.as_deref());
        self
    }

    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.display_name {
            self.display_name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
    }

    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }

    pub fn address(&self, id: &str) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == id)
    }

    /// Add an address and return it
    pub fn add_address(&mut self, input: AddressCreate) -> Address {
        let address = Address {
            id: util::record_id(),
            address_type: input.address_type,
            full_address: input.full_address,
            area: input.area,
            city: input.city,
            phone_number: input.phone_number,
            is_default: input.is_default || self.addresses.is_empty(),
        };
        let mut created = address.clone();
        let preferred = address.is_default.then(|| address.id.clone());
        self.addresses.push(address);
        self.settle_default(preferred.as_deref());
        created.is_default = self
            .default_address()
            .is_some_and(|a| a.id == created.id);
        created
    }

    /// Update an address; `None` if it does not exist
    pub fn update_address(&mut self, id: &str, update: AddressUpdate) -> Option<Address> {
        let address = self.addresses.iter_mut().find(|a| a.id == id)?;
        if let Some(t) = update.address_type {
            address.address_type = t;
        }
        if let Some(v) = update.full_address {
            address.full_address = v;
        }
        if let Some(v) = update.area {
            address.area = v;
        }
        if let Some(v) = update.city {
            address.city = v;
        }
        if let Some(v) = update.phone_number {
            address.phone_number = v;
        }
        let preferred = match update.is_default {
            Some(true) => Some(id.to_string()),
            Some(false) => {
                address.is_default = false;
                None
            }
            None => None,
        };
        let current_default = self.default_address().map(|a| a.id.clone());
        self.settle_default(preferred.as_deref().or(current_default.as_deref()));
        self.address(id).cloned()
    }

    /// Remove an address; promotes another if it was the default
    pub fn remove_address(&mut self, id: &str) -> Option<Address> {
        let idx = self.addresses.iter().position(|a| a.id == id)?;
        let removed = self.addresses.remove(idx);
        let current_default = self.default_address().map(|a| a.id.clone());
        self.settle_default(current_default.as_deref());
        Some(removed)
    }

    /// Mark an address as default; false if it does not exist
    pub fn set_default(&mut self, id: &str) -> bool {
        if self.address(id).is_none() {
            return false;
        }
        self.settle_default(Some(id));
        true
    }

    /// Exactly one default when addresses exist: `preferred` if it
    /// exists, otherwise the first address.
    fn settle_default(&mut self, preferred: Option<&str>) {
        if self.addresses.is_empty() {
            return;
        }
        let target = preferred
            .filter(|id| self.addresses.iter().any(|a| a.id == *id))
            .map(str::to_string)
            .unwrap_or_else(|| self.addresses[0].id.clone());
        for address in &mut self.addresses {
            address.is_default = address.id == target;
        }
    }
}
