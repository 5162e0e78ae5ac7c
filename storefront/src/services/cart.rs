//! Shopping cart service

use parking_lot::RwLock;
use shared::models::{Cart, CartItem};
use std::collections::BTreeMap;

use super::{Notifier, ServiceError, ServiceResult, SessionHandle};
use crate::storage::{RecordKind, RecordStorage};

#[derive(Debug, Default)]
struct CartState {
    /// User id or guest key the cart belongs to
    owner: String,
    cart: Cart,
}

/// Cart of the current owner (signed-in user or guest)
#[derive(Debug)]
pub struct CartManager {
    storage: RecordStorage,
    session: SessionHandle,
    notifier: Notifier,
    state: RwLock<CartState>,
}

impl CartManager {
    /// Create the service and load the current owner's cart
    pub fn new(
        storage: RecordStorage,
        session: SessionHandle,
        notifier: Notifier,
    ) -> ServiceResult<Self> {
        let manager = Self {
            storage,
            session,
            notifier,
            state: RwLock::new(CartState::default()),
        };
        manager.reload()?;
        Ok(manager)
    }

    /// Re-read the cart of whoever owns the session now
    pub fn reload(&self) -> ServiceResult<()> {
        let owner = self.session.owner_key();
        let cart: Cart = self
            .storage
            .load(&owner, RecordKind::Cart)
            .inspect_err(|e| tracing::error!(owner = %owner, error = %e, "Failed to load cart"))?
            .unwrap_or_default();
        tracing::debug!(owner = %owner, lines = cart.items.len(), "Cart loaded");
        *self.state.write() = CartState { owner, cart };
        Ok(())
    }

    pub fn cart(&self) -> Cart {
        self.state.read().cart.clone()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.state.read().cart.items.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().cart.is_empty()
    }

    /// Total number of units
    pub fn count(&self) -> u32 {
        self.state.read().cart.count()
    }

    pub fn subtotal(&self) -> f64 {
        self.state.read().cart.subtotal()
    }

    /// Add a line (merged with an identical line)
    pub fn add(&self, item: CartItem) -> ServiceResult<Cart> {
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            let err = ServiceError::Validation(format!("invalid price for {}", item.name));
            err.report(&self.notifier);
            return Err(err);
        }
        let name = item.name.clone();
        let cart = self.mutate(|cart| {
            cart.add(item);
            cart.clone()
        })?;
        self.notifier.success(format!("{} added to cart", name));
        Ok(cart)
    }

    /// Set a line's quantity; zero removes the line
    pub fn set_quantity(
        &self,
        product_id: u64,
        attributes: &BTreeMap<String, String>,
        quantity: u32,
    ) -> ServiceResult<bool> {
        self.mutate(|cart| cart.set_quantity(product_id, attributes, quantity))
    }

    pub fn remove(&self, product_id: u64, attributes: &BTreeMap<String, String>) -> ServiceResult<bool> {
        self.mutate(|cart| cart.remove(product_id, attributes))
    }

    pub fn clear(&self) -> ServiceResult<()> {
        self.mutate(Cart::clear)
    }

    /// Apply a change and persist it; memory is only updated after the write
    fn mutate<R>(&self, change: impl FnOnce(&mut Cart) -> R) -> ServiceResult<R> {
        let mut state = self.state.write();
        let mut next = state.cart.clone();
        let result = change(&mut next);
        if next == state.cart {
            return Ok(result);
        }
        if let Err(e) = self.storage.save(&state.owner, RecordKind::Cart, &next) {
            let err = ServiceError::from(e);
            err.report(&self.notifier);
            return Err(err);
        }
        state.cart = next;
        Ok(result)
    }
}
