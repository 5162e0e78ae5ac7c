//! OrdersManager - order lifecycle of the signed-in user
//!
//! This module handles:
//! - Order creation from the cart
//! - Status and payment transitions (terminal orders are closed)
//! - Persistence through [`RecordStorage`] (write before memory)
//! - Folding pulled remote orders into the local list
//! - Broadcasting changed orders to subscribers
//!
//! # Mutation Flow
//!
//! ```text
//! operation(order_id, ..)
//!     ├─ 1. Resolve owner (signed in?)
//!     ├─ 2. Find order, reject terminal
//!     ├─ 3. Apply change to a copy
//!     ├─ 4. Persist full list
//!     ├─ 5. Swap copy into memory
//!     ├─ 6. Broadcast order
//!     └─ 7. Report failure as notice (on error)
//! ```
//!
//! Remote calls never happen here; [`SyncService`](super::SyncService)
//! does the network work and hands results back through
//! [`attach_remote_id`](OrdersManager::attach_remote_id) and
//! [`merge_remote`](OrdersManager::merge_remote). Both name the user the
//! sync ran for, so a result that lands after an account switch never
//! reaches the new user's orders.

mod error;
pub use error::*;

use super::fees::FeeSchedule;
use super::merge::{MergeSummary, merge_orders, sort_newest_first};
use crate::services::{CartManager, Notifier, SessionHandle};
use crate::storage::{RecordKind, RecordStorage, StorageError};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shared::order::{
    DeliveryDetails, Order, OrderStatus, PaymentDetails, PaymentMethod, PaymentStatus,
};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Order broadcast channel capacity
const ORDER_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct OrdersState {
    /// `None` while signed out
    owner: Option<String>,
    /// Newest first
    orders: Vec<Order>,
}

/// Orders of the signed-in user
pub struct OrdersManager {
    storage: RecordStorage,
    session: SessionHandle,
    cart: Arc<CartManager>,
    notifier: Notifier,
    fees: FeeSchedule,
    state: RwLock<OrdersState>,
    order_tx: broadcast::Sender<Order>,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("OrdersManager")
            .field("owner", &state.owner)
            .field("orders", &state.orders.len())
            .field("fees", &self.fees)
            .finish()
    }
}

impl OrdersManager {
    /// Create the manager and load the signed-in user's orders
    pub fn new(
        storage: RecordStorage,
        session: SessionHandle,
        cart: Arc<CartManager>,
        notifier: Notifier,
        fees: FeeSchedule,
    ) -> ManagerResult<Self> {
        let (order_tx, _) = broadcast::channel(ORDER_CHANNEL_CAPACITY);
        let manager = Self {
            storage,
            session,
            cart,
            notifier,
            fees,
            state: RwLock::new(OrdersState::default()),
            order_tx,
        };
        manager.reload()?;
        Ok(manager)
    }

    /// Re-read orders for whoever is signed in now.
    ///
    /// Records that fail to parse or normalize are logged and skipped.
    pub fn reload(&self) -> ManagerResult<()> {
        let mut state = self.state.write();
        let owner = self.session.user_id();
        let orders = match &owner {
            Some(user_id) => self.load_orders(user_id)?,
            None => Vec::new(),
        };
        tracing::debug!(owner = ?owner, count = orders.len(), "Orders loaded");
        *state = OrdersState { owner, orders };
        Ok(())
    }

    fn load_orders(&self, user_id: &str) -> ManagerResult<Vec<Order>> {
        let raw: Vec<serde_json::Value> = self
            .storage
            .load(user_id, RecordKind::Orders)?
            .unwrap_or_default();

        let mut orders = Vec::with_capacity(raw.len());
        for value in raw {
            let parsed = serde_json::from_value::<Order>(value)
                .map_err(|e| e.to_string())
                .and_then(|o| o.normalize().map_err(|e| e.to_string()));
            match parsed {
                Ok(order) => orders.push(order),
                Err(reason) => {
                    tracing::warn!(user_id = %user_id, reason = %reason, "Skipping invalid stored order");
                }
            }
        }
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// Subscribe to orders changed by this manager
    pub fn subscribe(&self) -> broadcast::Receiver<Order> {
        self.order_tx.subscribe()
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    // ========== Queries ==========

    /// User whose orders are loaded
    pub fn owner(&self) -> Option<String> {
        self.state.read().owner.clone()
    }

    /// All orders, newest first
    pub fn orders(&self) -> Vec<Order> {
        self.state.read().orders.clone()
    }

    pub fn get_order(&self, order_id: &str) -> Option<Order> {
        self.state
            .read()
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
    }

    /// Orders not yet pushed to the remote platform
    pub fn unsynced_orders(&self) -> Vec<Order> {
        self.state
            .read()
            .orders
            .iter()
            .filter(|o| !o.is_synced())
            .cloned()
            .collect()
    }

    /// Delivery fee the current cart would be charged
    pub fn quote_delivery_fee(&self, details: &DeliveryDetails) -> f64 {
        self.fees
            .delivery_fee(self.cart.subtotal(), &details.city, details.delivery_time)
    }

    // ========== Operations ==========

    /// Place an order from the current cart.
    ///
    /// The cart is cleared only after the order is stored.
    pub fn create_order(&self, details: DeliveryDetails) -> ManagerResult<Order> {
        let order = self.place(details).inspect_err(|e| self.report(e))?;

        if let Err(e) = self.cart.clear() {
            tracing::warn!(order_id = %order.id, error = %e, "Order stored but cart not cleared");
        }
        tracing::info!(
            order_id = %order.id,
            total = order.total,
            delivery_fee = order.delivery_fee,
            "Order placed"
        );
        self.notifier.success(format!("Order {} placed", order.id));
        self.broadcast(&order);
        Ok(order)
    }

    fn place(&self, details: DeliveryDetails) -> ManagerResult<Order> {
        let mut state = self.state.write();
        let owner = state.owner.clone().ok_or(ManagerError::NotSignedIn)?;

        let cart = self.cart.cart();
        if cart.is_empty() {
            return Err(ManagerError::CartEmpty);
        }
        details.validate()?;

        let fee = self
            .fees
            .delivery_fee(cart.subtotal(), &details.city, details.delivery_time);
        let order = Order::place(
            shared::util::local_order_id(),
            owner.as_str(),
            cart.line_items(),
            details,
            fee,
            shared::util::now(),
        )?;

        let mut next = Vec::with_capacity(state.orders.len() + 1);
        next.push(order.clone());
        next.extend(state.orders.iter().cloned());
        self.storage.save(&owner, RecordKind::Orders, &next)?;
        state.orders = next;
        Ok(order)
    }

    /// Cancel a pending order
    pub fn cancel_order(&self, order_id: &str) -> ManagerResult<Order> {
        self.mutate(order_id, |order, now| {
            if order.status != OrderStatus::Pending {
                return Err(invalid(order, "cancel"));
            }
            order.transition(OrderStatus::Cancelled, now);
            Ok(true)
        })
    }

    /// Move to any status; same status is a no-op
    pub fn update_order_status(&self, order_id: &str, status: OrderStatus) -> ManagerResult<Order> {
        self.mutate(order_id, |order, now| {
            if order.status == status {
                return Ok(false);
            }
            order.transition(status, now);
            Ok(true)
        })
    }

    /// Record the payment choice of a pending order
    ///
    /// | method  | details            | status     | payment |
    /// |---------|--------------------|------------|---------|
    /// | cod     | any                | confirmed  | pending |
    /// | online  | status `paid`      | processing | paid    |
    /// | online  | otherwise          | pending    | pending |
    /// | pending | any                | pending    | pending |
    pub fn confirm_order(
        &self,
        order_id: &str,
        method: PaymentMethod,
        details: Option<PaymentDetails>,
    ) -> ManagerResult<Order> {
        self.mutate(order_id, |order, now| {
            if order.status != OrderStatus::Pending {
                return Err(invalid(order, "confirm"));
            }
            let reported_paid = details
                .as_ref()
                .is_some_and(|d| d.status == Some(PaymentStatus::Paid));
            let (status, payment_status) = match method {
                PaymentMethod::Cod => (OrderStatus::Confirmed, PaymentStatus::Pending),
                PaymentMethod::Online if reported_paid => {
                    (OrderStatus::Processing, PaymentStatus::Paid)
                }
                PaymentMethod::Online | PaymentMethod::Pending => {
                    (OrderStatus::Pending, PaymentStatus::Pending)
                }
            };

            order.payment_method = method;
            order.payment_status = payment_status;
            if let Some(tx) = details.as_ref().and_then(PaymentDetails::transaction_id) {
                order.transaction_id = Some(tx.to_string());
            }
            order.transition(status, now);
            Ok(true)
        })
    }

    /// Record a payment result.
    ///
    /// A paid result with a transaction id moves a pending order to
    /// processing; anything else only changes the payment status.
    pub fn update_payment_status(
        &self,
        order_id: &str,
        payment_status: PaymentStatus,
        details: Option<PaymentDetails>,
    ) -> ManagerResult<Order> {
        self.mutate(order_id, |order, now| {
            if order.payment_status == payment_status {
                return Ok(false);
            }
            let tx = details
                .as_ref()
                .and_then(PaymentDetails::transaction_id)
                .map(str::to_string);

            order.payment_status = payment_status;
            match tx {
                Some(tx)
                    if payment_status == PaymentStatus::Paid
                        && order.status == OrderStatus::Pending =>
                {
                    order.transaction_id = Some(tx);
                    order.transition(OrderStatus::Processing, now);
                }
                _ => order.touch(now),
            }
            Ok(true)
        })
    }

    // ========== Sync hooks ==========

    /// Remember the remote id of an order pushed for `owner`.
    ///
    /// Sync metadata only, so terminal orders accept it too. When `owner`
    /// is no longer loaded the id is written to their stored record, so
    /// the next sync does not push the order again.
    pub fn attach_remote_id(
        &self,
        owner: &str,
        order_id: &str,
        remote_id: u64,
    ) -> ManagerResult<Order> {
        let mut state = self.state.write();
        let result = if state.owner.as_deref() == Some(owner) {
            self.apply(&mut state, order_id, false, |order, _| {
                if order.remote_id == Some(remote_id) {
                    return Ok(false);
                }
                order.remote_id = Some(remote_id);
                Ok(true)
            })
        } else {
            self.attach_stored(owner, order_id, remote_id)
                .map(|order| (order, false))
        };
        drop(state);

        match result {
            Ok((order, changed)) => {
                if changed {
                    self.announce(&order);
                }
                Ok(order)
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Fold orders pulled for `owner` into the local list and persist the result.
    ///
    /// Rejected with [`ManagerError::SessionChanged`] once `owner` is no
    /// longer the loaded user.
    pub fn merge_remote(&self, owner: &str, remote: Vec<Order>) -> ManagerResult<MergeSummary> {
        let result = self.fold_remote(owner, remote);
        match &result {
            Ok(summary) => tracing::info!(
                updated = summary.updated,
                added = summary.added,
                unchanged = summary.unchanged,
                "Remote orders merged"
            ),
            Err(e) => self.report(e),
        }
        result
    }

    // ========== Internals ==========

    fn fold_remote(&self, owner: &str, remote: Vec<Order>) -> ManagerResult<MergeSummary> {
        let mut state = self.state.write();
        if state.owner.as_deref() != Some(owner) {
            return Err(ManagerError::SessionChanged {
                expected: owner.to_string(),
            });
        }
        let (merged, summary) = merge_orders(state.orders.clone(), remote, owner);
        if summary.changed() {
            self.storage.save(owner, RecordKind::Orders, &merged)?;
            state.orders = merged;
        }
        Ok(summary)
    }

    /// Set `remote_id` on a stored record of a user who is not loaded.
    ///
    /// Works on the raw records so entries that fail to parse survive the rewrite.
    /// Called with the state lock held, which keeps a concurrent reload out.
    fn attach_stored(&self, owner: &str, order_id: &str, remote_id: u64) -> ManagerResult<Order> {
        let mut raw: Vec<serde_json::Value> = self
            .storage
            .load(owner, RecordKind::Orders)?
            .unwrap_or_default();
        let entry = raw
            .iter_mut()
            .filter_map(serde_json::Value::as_object_mut)
            .find(|o| o.get("id").and_then(serde_json::Value::as_str) == Some(order_id))
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        entry.insert("remote_id".to_string(), remote_id.into());
        let order: Order = serde_json::from_value(serde_json::Value::Object(entry.clone()))
            .map_err(StorageError::from)?;

        self.storage.save(owner, RecordKind::Orders, &raw)?;
        tracing::info!(
            user_id = %owner,
            order_id = %order_id,
            remote_id,
            "Remote id stored for a user who is not loaded"
        );
        Ok(order)
    }

    /// Guarded mutation of one order; terminal orders are rejected
    fn mutate(
        &self,
        order_id: &str,
        change: impl FnOnce(&mut Order, DateTime<Utc>) -> ManagerResult<bool>,
    ) -> ManagerResult<Order> {
        self.write_order(order_id, true, change)
            .inspect_err(|e| self.report(e))
    }

    fn write_order(
        &self,
        order_id: &str,
        guard_terminal: bool,
        change: impl FnOnce(&mut Order, DateTime<Utc>) -> ManagerResult<bool>,
    ) -> ManagerResult<Order> {
        let mut state = self.state.write();
        let (order, changed) = self.apply(&mut state, order_id, guard_terminal, change)?;
        drop(state);

        if changed {
            self.announce(&order);
        }
        Ok(order)
    }

    /// `change` returns whether the order changed; unchanged orders are not written
    fn apply(
        &self,
        state: &mut OrdersState,
        order_id: &str,
        guard_terminal: bool,
        change: impl FnOnce(&mut Order, DateTime<Utc>) -> ManagerResult<bool>,
    ) -> ManagerResult<(Order, bool)> {
        let owner = state.owner.clone().ok_or(ManagerError::NotSignedIn)?;
        let idx = state
            .orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;

        let current = &state.orders[idx];
        if guard_terminal && current.is_terminal() {
            return Err(ManagerError::OrderClosed {
                order_id: current.id.clone(),
                status: current.status,
            });
        }

        let mut order = current.clone();
        if !change(&mut order, shared::util::now())? {
            return Ok((order, false));
        }

        let previous = std::mem::replace(&mut state.orders[idx], order.clone());
        if let Err(e) = self.storage.save(&owner, RecordKind::Orders, &state.orders) {
            state.orders[idx] = previous;
            return Err(e.into());
        }
        Ok((order, true))
    }

    fn announce(&self, order: &Order) {
        tracing::debug!(
            order_id = %order.id,
            status = %order.status,
            payment_status = order.payment_status.as_str(),
            "Order updated"
        );
        self.broadcast(order);
    }

    fn broadcast(&self, order: &Order) {
        // 无订阅者时丢弃
        let _ = self.order_tx.send(order.clone());
    }

    fn report(&self, err: &ManagerError) {
        if let ManagerError::SessionChanged { expected } = err {
            // 结果属于已登出的用户，不提示当前用户
            tracing::info!(expected = %expected, "Sync result dropped after account switch");
            return;
        }
        if err.is_state_conflict() {
            tracing::warn!(error = %err, "Order operation rejected");
        }
        self.notifier.error(err.code(), err.user_message());
    }
}

fn invalid(order: &Order, action: &'static str) -> ManagerError {
    ManagerError::InvalidTransition {
        order_id: order.id.clone(),
        status: order.status,
        action,
    }
}

#[cfg(test)]
mod tests;
