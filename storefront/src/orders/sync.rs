//! Remote order synchronization
//!
//! # Protocol
//!
//! 1. Link the signed-in user to a remote customer (email lookup or create)
//! 2. Push every local order without a `remote_id`
//! 3. Pull the customer's remote orders
//! 4. Merge them into the local list ([`merge_orders`](super::merge_orders))
//!
//! The user a sync runs for is fixed when it starts. Results that come back
//! after an account switch are never applied to the new user.
//!
//! Status changes made locally are pushed in the background, one at a
//! time, each sending the order's status as it is when the push starts. A
//! failed push is logged and never rolls back the local change.
//!
//! No lock is held across a network call. Results are applied through the
//! manager, which re-reads current state under its own lock.

use super::manager::{ManagerError, OrdersManager};
use super::merge::MergeSummary;
use crate::services::SessionHandle;
use shared::ErrorCode;
use shared::models::CustomerSnapshot;
use shared::order::Order;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use woo_client::{ClientError, CustomerRemote, OrderRemote};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Manager(ManagerError),

    #[error("Not signed in")]
    NotSignedIn,

    /// Another user signed in (or the user signed out) mid-sync
    #[error("Signed-in user changed during sync")]
    SessionChanged,

    /// Session has no remote customer id yet
    #[error("No remote customer linked to the session")]
    CustomerNotLinked,
}

impl From<ManagerError> for SyncError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::SessionChanged { .. } => SyncError::SessionChanged,
            other => SyncError::Manager(other),
        }
    }
}

impl SyncError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::Client(e) => e.code(),
            SyncError::Manager(e) => e.code(),
            SyncError::NotSignedIn => ErrorCode::NotAuthenticated,
            SyncError::SessionChanged => ErrorCode::SessionChanged,
            SyncError::CustomerNotLinked => ErrorCode::RemoteCustomerMissing,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Outcome of [`SyncService::sync_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    /// Orders whose push failed (kept locally, retried next sync)
    pub push_failed: usize,
    pub pulled: usize,
    /// Remote records skipped as unexpected
    pub rejected: usize,
    pub merge: MergeSummary,
}

/// User and remote customer a sync runs for
struct SyncTarget {
    user_id: String,
    customer: CustomerSnapshot,
    remote_customer_id: u64,
}

/// Moves orders between the local store and the remote platform
pub struct SyncService {
    manager: Arc<OrdersManager>,
    session: SessionHandle,
    orders: Arc<dyn OrderRemote>,
    customers: Option<Arc<dyn CustomerRemote>>,
    /// Status pushes go out one at a time
    status_lane: Arc<Mutex<()>>,
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("orders", &"<dyn OrderRemote>")
            .field("customers", &self.customers.is_some())
            .finish()
    }
}

impl SyncService {
    pub fn new(
        manager: Arc<OrdersManager>,
        session: SessionHandle,
        orders: Arc<dyn OrderRemote>,
    ) -> Self {
        Self {
            manager,
            session,
            orders,
            customers: None,
            status_lane: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_customers(mut self, customers: Arc<dyn CustomerRemote>) -> Self {
        self.customers = Some(customers);
        self
    }

    /// Resolve the remote customer for `snapshot` and store it on the session
    pub async fn link_customer(&self, snapshot: &CustomerSnapshot) -> SyncResult<CustomerSnapshot> {
        let user_id = self.session.user_id().ok_or(SyncError::NotSignedIn)?;
        let customers = self
            .customers
            .as_ref()
            .ok_or(ClientError::NotConfigured("customer endpoint"))?;

        let linked = customers.ensure(snapshot).await?;
        if !self.session.set_customer(&user_id, linked.clone()) {
            tracing::info!(user_id = %user_id, "Customer link dropped after account switch");
            return Err(SyncError::SessionChanged);
        }
        tracing::info!(
            user_id = %user_id,
            remote_customer_id = ?linked.remote_customer_id,
            "Remote customer linked"
        );
        Ok(linked)
    }

    fn target(&self) -> SyncResult<SyncTarget> {
        let session = self.session.current().ok_or(SyncError::NotSignedIn)?;
        if self.manager.owner().as_deref() != Some(session.user_id.as_str()) {
            return Err(SyncError::SessionChanged);
        }
        let customer = session.customer.ok_or(SyncError::CustomerNotLinked)?;
        let remote_customer_id = customer
            .remote_customer_id
            .ok_or(SyncError::CustomerNotLinked)?;
        Ok(SyncTarget {
            user_id: session.user_id,
            customer,
            remote_customer_id,
        })
    }

    /// Push one order; already synced orders return their remote id
    pub async fn push_order(&self, order_id: &str) -> SyncResult<u64> {
        let target = self.target()?;
        let order = self
            .manager
            .get_order(order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        self.push_for(&target, &order).await
    }

    async fn push_for(&self, target: &SyncTarget, order: &Order) -> SyncResult<u64> {
        if order.user_id != target.user_id {
            return Err(SyncError::SessionChanged);
        }
        if let Some(remote_id) = order.remote_id {
            return Ok(remote_id);
        }

        let remote_id = self
            .orders
            .push(order, &target.customer)
            .await
            .inspect_err(|e| {
                tracing::warn!(order_id = %order.id, error = %e, "Order push failed");
            })?;
        // 即使期间切换了用户，也要记住远程 id，避免重复推送
        self.manager
            .attach_remote_id(&target.user_id, &order.id, remote_id)?;
        Ok(remote_id)
    }

    /// Push unsynced orders, then pull and merge the remote list
    pub async fn sync_all(&self) -> SyncResult<SyncReport> {
        let target = self.target()?;
        let mut report = SyncReport::default();

        for order in self.manager.unsynced_orders() {
            match self.push_for(&target, &order).await {
                Ok(_) => report.pushed += 1,
                Err(SyncError::SessionChanged) => return Err(SyncError::SessionChanged),
                Err(_) => report.push_failed += 1,
            }
        }

        let pulled = self.orders.pull(target.remote_customer_id).await?;
        report.pulled = pulled.orders.len();
        report.rejected = pulled.rejected;
        report.merge = self.manager.merge_remote(&target.user_id, pulled.orders)?;

        tracing::info!(
            user_id = %target.user_id,
            pushed = report.pushed,
            push_failed = report.push_failed,
            pulled = report.pulled,
            rejected = report.rejected,
            "Order sync finished"
        );
        Ok(report)
    }

    /// Propagate the order's status in the background.
    ///
    /// Pushes run one after another and each re-reads the order before
    /// sending, so the last request to land carries the latest status.
    /// Returns `None` when the order was never pushed or no runtime is
    /// available; the local change stands either way.
    pub fn spawn_status_push(&self, order: &Order) -> Option<JoinHandle<()>> {
        let remote_id = order.remote_id?;
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(order_id = %order.id, "No async runtime, status push skipped");
                return None;
            }
        };

        let orders = self.orders.clone();
        let manager = self.manager.clone();
        let lane = self.status_lane.clone();
        let order_id = order.id.clone();
        let fallback = (order.status, order.payment_status);
        Some(handle.spawn(async move {
            let _turn = lane.lock().await;
            // 用户切换后订单不在内存中，退回到创建任务时的状态
            let (status, payment_status) = manager
                .get_order(&order_id)
                .filter(|current| current.remote_id == Some(remote_id))
                .map(|current| (current.status, current.payment_status))
                .unwrap_or(fallback);

            match orders.update_status(remote_id, status, payment_status).await {
                Ok(()) => tracing::debug!(order_id = %order_id, remote_id, status = %status, "Status pushed"),
                Err(e) => tracing::warn!(
                    order_id = %order_id,
                    remote_id,
                    error = %e,
                    "Status push failed, local change kept"
                ),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::FeeSchedule;
    use crate::services::{CartManager, Notifier, Session};
    use crate::storage::{RecordKind, RecordStorage};
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use shared::models::CartItem;
    use shared::order::{
        DeliveryDetails, OrderStatus, PaymentMethod, PaymentStatus, StatusEntry,
    };
    use std::collections::BTreeMap;
    use std::time::Duration;
    use tokio::sync::Notify;
    use woo_client::{ClientResult, PulledOrders};

    /// Holds a remote call open until released
    #[derive(Default)]
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    impl Gate {
        async fn pass(&self) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }

    /// In-memory remote platform
    #[derive(Default)]
    struct FakeRemote {
        next_id: SyncMutex<u64>,
        pushed: SyncMutex<Vec<String>>,
        remote_orders: SyncMutex<Vec<Order>>,
        status_updates: SyncMutex<Vec<(u64, OrderStatus, PaymentStatus)>>,
        update_calls: SyncMutex<usize>,
        fail_push: bool,
        slow_first_update: bool,
        push_gate: Option<Arc<Gate>>,
        pull_gate: Option<Arc<Gate>>,
    }

    #[async_trait]
    impl OrderRemote for FakeRemote {
        async fn push(&self, order: &Order, _customer: &CustomerSnapshot) -> ClientResult<u64> {
            if self.fail_push {
                return Err(ClientError::Remote {
                    status: 503,
                    body: "down".into(),
                });
            }
            if let Some(gate) = &self.push_gate {
                gate.pass().await;
            }
            let remote_id = {
                let mut next = self.next_id.lock();
                *next += 1;
                500 + *next
            };
            self.pushed.lock().push(order.id.clone());

            let mut remote = order.clone();
            remote.remote_id = Some(remote_id);
            self.remote_orders.lock().push(remote);
            Ok(remote_id)
        }

        async fn pull(&self, _remote_customer_id: u64) -> ClientResult<PulledOrders> {
            if let Some(gate) = &self.pull_gate {
                gate.pass().await;
            }
            Ok(PulledOrders {
                orders: self.remote_orders.lock().clone(),
                rejected: 0,
            })
        }

        async fn update_status(
            &self,
            remote_id: u64,
            status: OrderStatus,
            payment_status: PaymentStatus,
        ) -> ClientResult<()> {
            let first = {
                let mut calls = self.update_calls.lock();
                *calls += 1;
                *calls == 1
            };
            if first && self.slow_first_update {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.status_updates
                .lock()
                .push((remote_id, status, payment_status));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeCustomers {
        gate: Option<Arc<Gate>>,
    }

    #[async_trait]
    impl CustomerRemote for FakeCustomers {
        async fn ensure(&self, snapshot: &CustomerSnapshot) -> ClientResult<CustomerSnapshot> {
            if let Some(gate) = &self.gate {
                gate.pass().await;
            }
            Ok(CustomerSnapshot {
                remote_customer_id: Some(42),
                ..snapshot.clone()
            })
        }
    }

    struct Setup {
        storage: RecordStorage,
        manager: Arc<OrdersManager>,
        cart: Arc<CartManager>,
        session: SessionHandle,
    }

    fn setup(linked: bool) -> Setup {
        let storage = RecordStorage::open_in_memory().unwrap();
        let mut session = Session::new("u1", "u1@example.com");
        if linked {
            session = session.with_customer(CustomerSnapshot {
                remote_customer_id: Some(42),
                first_name: "Rahim".into(),
                email: "u1@example.com".into(),
                ..Default::default()
            });
        }
        let session = SessionHandle::signed_in(session);
        let notifier = Notifier::new();
        let cart = Arc::new(CartManager::new(storage.clone(), session.clone(), notifier.clone()).unwrap());
        let manager = Arc::new(
            OrdersManager::new(
                storage.clone(),
                session.clone(),
                cart.clone(),
                notifier,
                FeeSchedule::default(),
            )
            .unwrap(),
        );
        Setup {
            storage,
            manager,
            cart,
            session,
        }
    }

    fn place(setup: &Setup) -> Order {
        setup
            .cart
            .add(CartItem {
                product_id: 7,
                name: "Mango".into(),
                quantity: 2,
                unit_price: 120.0,
                selected_attributes: BTreeMap::new(),
                images: vec![],
            })
            .unwrap();
        setup
            .manager
            .create_order(DeliveryDetails {
                name: "Rahim".into(),
                phone: "017".into(),
                address: "House 1".into(),
                city: "Dhaka".into(),
                ..Default::default()
            })
            .unwrap()
    }

    fn web_order(template: &Order, remote_id: u64) -> Order {
        let mut order = template.clone();
        order.id = format!("wc-{}", remote_id);
        order.remote_id = Some(remote_id);
        order.status = OrderStatus::Processing;
        order.status_history = vec![StatusEntry::new(OrderStatus::Processing, shared::util::now())];
        order
    }

    /// Sign bob in the way the storefront does it
    fn switch_to_bob(s: &Setup) {
        s.session.sign_in(Session::new("bob", "bob@example.com"));
        s.manager.reload().unwrap();
    }

    #[tokio::test]
    async fn test_push_order_attaches_remote_id() {
        let s = setup(true);
        let remote = Arc::new(FakeRemote::default());
        let sync = SyncService::new(s.manager.clone(), s.session.clone(), remote.clone());
        let order = place(&s);

        let remote_id = sync.push_order(&order.id).await.unwrap();
        assert_eq!(remote_id, 501);
        assert_eq!(s.manager.get_order(&order.id).unwrap().remote_id, Some(501));

        // second push is a no-op
        assert_eq!(sync.push_order(&order.id).await.unwrap(), 501);
        assert_eq!(remote.pushed.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_push_requires_linked_customer() {
        let s = setup(false);
        let remote = Arc::new(FakeRemote::default());
        let sync = SyncService::new(s.manager.clone(), s.session.clone(), remote.clone());
        let order = place(&s);

        let err = sync.push_order(&order.id).await.unwrap_err();
        assert!(matches!(err, SyncError::CustomerNotLinked));
        assert_eq!(err.code(), ErrorCode::RemoteCustomerMissing);
        assert!(remote.pushed.lock().is_empty());
    }

    #[tokio::test]
    async fn test_sync_all_pushes_then_merges() {
        let s = setup(true);
        let remote = Arc::new(FakeRemote::default());
        let template = place(&s);
        remote.remote_orders.lock().push(web_order(&template, 900));

        let sync = SyncService::new(s.manager.clone(), s.session.clone(), remote.clone());
        let report = sync.sync_all().await.unwrap();

        assert_eq!(report.pushed, 1);
        assert_eq!(report.push_failed, 0);
        assert_eq!(report.pulled, 2);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.merge.added, 1);
        assert!(s.manager.unsynced_orders().is_empty());
        assert_eq!(s.manager.orders().len(), 2);
        assert_eq!(s.manager.get_order("wc-900").unwrap().user_id, "u1");

        // nothing new the second time
        let again = sync.sync_all().await.unwrap();
        assert_eq!(again.pushed, 0);
        assert!(!again.merge.changed());
    }

    #[tokio::test]
    async fn test_failed_push_keeps_order_local() {
        let s = setup(true);
        let remote = Arc::new(FakeRemote {
            fail_push: true,
            ..Default::default()
        });
        let sync = SyncService::new(s.manager.clone(), s.session.clone(), remote.clone());
        let order = place(&s);

        let report = sync.sync_all().await.unwrap();
        assert_eq!(report.push_failed, 1);
        assert_eq!(s.manager.unsynced_orders()[0].id, order.id);
    }

    #[tokio::test]
    async fn test_status_push_only_for_synced_orders() {
        let s = setup(true);
        let remote = Arc::new(FakeRemote::default());
        let sync = SyncService::new(s.manager.clone(), s.session.clone(), remote.clone());
        let order = place(&s);

        assert!(sync.spawn_status_push(&order).is_none());

        sync.push_order(&order.id).await.unwrap();
        let cancelled = s.manager.cancel_order(&order.id).unwrap();
        sync.spawn_status_push(&cancelled).unwrap().await.unwrap();

        assert_eq!(
            remote.status_updates.lock().as_slice(),
            &[(501, OrderStatus::Cancelled, PaymentStatus::Unpaid)]
        );
    }

    #[tokio::test]
    async fn test_status_pushes_land_in_order() {
        let s = setup(true);
        let remote = Arc::new(FakeRemote {
            slow_first_update: true,
            ..Default::default()
        });
        let sync = SyncService::new(s.manager.clone(), s.session.clone(), remote.clone());
        let order = place(&s);
        sync.push_order(&order.id).await.unwrap();
        s.manager
            .confirm_order(&order.id, PaymentMethod::Cod, None)
            .unwrap();

        let shipped = s
            .manager
            .update_order_status(&order.id, OrderStatus::Shipped)
            .unwrap();
        let first = sync.spawn_status_push(&shipped).unwrap();
        // first push is now in flight and slow
        tokio::task::yield_now().await;

        let completed = s
            .manager
            .update_order_status(&order.id, OrderStatus::Completed)
            .unwrap();
        let second = sync.spawn_status_push(&completed).unwrap();
        first.await.unwrap();
        second.await.unwrap();

        let statuses: Vec<OrderStatus> = remote
            .status_updates
            .lock()
            .iter()
            .map(|(_, status, _)| *status)
            .collect();
        assert_eq!(statuses.len(), 2);
        // the remote copy ends on the latest local status
        assert_eq!(statuses.last(), Some(&OrderStatus::Completed));
    }

    #[tokio::test]
    async fn test_link_customer() {
        let s = setup(false);
        let sync = SyncService::new(s.manager.clone(), s.session.clone(), Arc::new(FakeRemote::default()));
        let snapshot = CustomerSnapshot::from_display_name("Rahim Uddin", "u1@example.com", "017");

        // no customer endpoint configured
        let err = sync.link_customer(&snapshot).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RemoteNotConfigured);

        let sync = sync.with_customers(Arc::new(FakeCustomers::default()));
        let linked = sync.link_customer(&snapshot).await.unwrap();
        assert_eq!(linked.remote_customer_id, Some(42));
        assert_eq!(s.session.customer().unwrap().remote_customer_id, Some(42));
    }

    // ========== Account switch mid-sync ==========

    #[tokio::test]
    async fn test_pull_after_account_switch_is_dropped() {
        let s = setup(true);
        let gate = Arc::new(Gate::default());
        let remote = Arc::new(FakeRemote {
            pull_gate: Some(gate.clone()),
            ..Default::default()
        });
        let order = place(&s);
        remote.remote_orders.lock().push(web_order(&order, 77));
        let sync = Arc::new(SyncService::new(s.manager.clone(), s.session.clone(), remote.clone()));

        let running = tokio::spawn({
            let sync = sync.clone();
            async move { sync.sync_all().await }
        });
        gate.entered.notified().await;
        switch_to_bob(&s);
        gate.release.notify_one();

        let err = running.await.unwrap().unwrap_err();
        assert!(matches!(err, SyncError::SessionChanged));
        assert_eq!(err.code(), ErrorCode::SessionChanged);
        assert!(s.manager.orders().is_empty());
        assert!(s.storage.load::<Vec<Order>>("bob", RecordKind::Orders).unwrap().is_none());

        // alice's own push finished before the switch and was kept
        s.session.sign_in(Session::new("u1", "u1@example.com"));
        s.manager.reload().unwrap();
        assert_eq!(s.manager.get_order(&order.id).unwrap().remote_id, Some(501));
        assert!(s.manager.get_order("wc-77").is_none());
    }

    #[tokio::test]
    async fn test_push_after_account_switch_keeps_remote_id() {
        let s = setup(true);
        let gate = Arc::new(Gate::default());
        let remote = Arc::new(FakeRemote {
            push_gate: Some(gate.clone()),
            ..Default::default()
        });
        let order = place(&s);
        let sync = Arc::new(SyncService::new(s.manager.clone(), s.session.clone(), remote.clone()));

        let running = tokio::spawn({
            let sync = sync.clone();
            let order_id = order.id.clone();
            async move { sync.push_order(&order_id).await }
        });
        gate.entered.notified().await;
        switch_to_bob(&s);
        gate.release.notify_one();

        assert_eq!(running.await.unwrap().unwrap(), 501);
        assert!(s.manager.orders().is_empty());

        // back as alice: the order is synced, nothing to push again
        s.session.sign_in(Session::new("u1", "u1@example.com"));
        s.manager.reload().unwrap();
        assert_eq!(s.manager.get_order(&order.id).unwrap().remote_id, Some(501));
        assert!(s.manager.unsynced_orders().is_empty());
    }

    #[tokio::test]
    async fn test_customer_link_after_account_switch_is_dropped() {
        let s = setup(false);
        let gate = Arc::new(Gate::default());
        let sync = Arc::new(
            SyncService::new(s.manager.clone(), s.session.clone(), Arc::new(FakeRemote::default()))
                .with_customers(Arc::new(FakeCustomers {
                    gate: Some(gate.clone()),
                })),
        );
        let snapshot = CustomerSnapshot::from_display_name("Rahim Uddin", "u1@example.com", "017");

        let running = tokio::spawn({
            let sync = sync.clone();
            async move { sync.link_customer(&snapshot).await }
        });
        gate.entered.notified().await;
        switch_to_bob(&s);
        gate.release.notify_one();

        let err = running.await.unwrap().unwrap_err();
        assert!(matches!(err, SyncError::SessionChanged));
        assert!(s.session.customer().is_none());
    }

    #[tokio::test]
    async fn test_sync_refuses_when_orders_not_reloaded() {
        let s = setup(true);
        let sync = SyncService::new(s.manager.clone(), s.session.clone(), Arc::new(FakeRemote::default()));
        s.session.sign_in(Session::new("bob", "bob@example.com").with_customer(CustomerSnapshot {
            remote_customer_id: Some(43),
            ..Default::default()
        }));

        let err = sync.sync_all().await.unwrap_err();
        assert!(matches!(err, SyncError::SessionChanged));
    }
}
