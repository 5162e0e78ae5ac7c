use std::sync::Arc;

use shared::models::CustomerSnapshot;
use shared::order::{
    DeliveryDetails, DeliveryTime, Order, OrderStatus, PaymentDetails, PaymentMethod,
    PaymentStatus,
};
use woo_client::{ClientError, CustomerRemote, OrderRemote, WooCustomers, WooOrders};

use super::config::StoreConfig;
use super::error::Result;
use crate::orders::{ManagerResult, OrdersManager, SyncError, SyncReport, SyncResult, SyncService};
use crate::services::{
    CartManager, FavoritesManager, Notice, Notifier, ProfileManager, Session, SessionHandle,
};
use crate::storage::RecordStorage;

/// 店面状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，可在任务之间传递。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | StoreConfig | 配置项 (不可变) |
/// | storage | RecordStorage | 嵌入式存储 (redb) |
/// | session | SessionHandle | 当前登录会话 |
/// | notifier | Notifier | 用户提示广播 |
/// | cart | Arc<CartManager> | 购物车 |
/// | favorites | Arc<FavoritesManager> | 收藏 |
/// | profile | Arc<ProfileManager> | 用户资料与地址 |
/// | orders | Arc<OrdersManager> | 订单生命周期 |
/// | sync | Option<Arc<SyncService>> | 远程同步 (未配置时为 None) |
///
/// # 使用示例
///
/// ```ignore
/// let store = Storefront::open(config)?;
/// store.sign_in(Session::new("u1", "u1@example.com"))?;
/// store.link_customer().await?;
/// let order = store.checkout(details).await?;
/// ```
#[derive(Clone, Debug)]
pub struct Storefront {
    pub config: StoreConfig,
    pub storage: RecordStorage,
    pub session: SessionHandle,
    pub notifier: Notifier,
    pub cart: Arc<CartManager>,
    pub favorites: Arc<FavoritesManager>,
    pub profile: Arc<ProfileManager>,
    pub orders: Arc<OrdersManager>,
    pub sync: Option<Arc<SyncService>>,
}

impl Storefront {
    /// 打开店面 (磁盘数据库 + 远程平台)
    ///
    /// Without remote credentials the store works locally and every sync
    /// call fails with `NotConfigured`.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let storage = RecordStorage::open(config.db_path())?;
        tracing::info!(db = %config.db_path().display(), "Storefront storage opened");

        let (orders, customers) = if config.woo.is_configured() {
            let client = config.woo.build_client()?;
            let orders: Arc<dyn OrderRemote> = Arc::new(WooOrders::new(client.clone()));
            let customers: Arc<dyn CustomerRemote> = Arc::new(WooCustomers::new(client));
            (Some(orders), Some(customers))
        } else {
            tracing::warn!("Remote platform not configured, orders stay local");
            (None, None)
        };

        Self::with_remote(config, storage, orders, customers)
    }

    /// 内存存储，无远程平台 (测试用)
    pub fn open_in_memory(config: StoreConfig) -> Result<Self> {
        Self::with_remote(config, RecordStorage::open_in_memory()?, None, None)
    }

    /// Assemble services over explicit storage and remote endpoints
    pub fn with_remote(
        config: StoreConfig,
        storage: RecordStorage,
        orders: Option<Arc<dyn OrderRemote>>,
        customers: Option<Arc<dyn CustomerRemote>>,
    ) -> Result<Self> {
        let session = SessionHandle::new();
        let notifier = Notifier::new();

        let cart = Arc::new(CartManager::new(
            storage.clone(),
            session.clone(),
            notifier.clone(),
        )?);
        let favorites = Arc::new(FavoritesManager::new(
            storage.clone(),
            session.clone(),
            notifier.clone(),
        )?);
        let profile = Arc::new(ProfileManager::new(
            storage.clone(),
            session.clone(),
            notifier.clone(),
        )?);
        let order_manager = Arc::new(OrdersManager::new(
            storage.clone(),
            session.clone(),
            cart.clone(),
            notifier.clone(),
            config.fees.clone(),
        )?);

        let sync = orders.map(|remote| {
            let service = SyncService::new(order_manager.clone(), session.clone(), remote);
            let service = match customers {
                Some(customers) => service.with_customers(customers),
                None => service,
            };
            Arc::new(service)
        });

        Ok(Self {
            config,
            storage,
            session,
            notifier,
            cart,
            favorites,
            profile,
            orders: order_manager,
            sync,
        })
    }

    pub fn subscribe_notices(&self) -> tokio::sync::broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }

    // ========== Session ==========

    /// 登录并切换到该用户的数据
    pub fn sign_in(&self, session: Session) -> Result<()> {
        let user_id = session.user_id.clone();
        self.session.sign_in(session);
        self.reload()?;
        tracing::info!(user_id = %user_id, "Signed in");
        Ok(())
    }

    /// 登出，购物车切回游客
    pub fn sign_out(&self) -> Result<Option<Session>> {
        let previous = self.session.sign_out();
        self.reload()?;
        if let Some(session) = &previous {
            tracing::info!(user_id = %session.user_id, "Signed out");
        }
        Ok(previous)
    }

    /// Re-read every service for the current session
    pub fn reload(&self) -> Result<()> {
        self.cart.reload()?;
        self.favorites.reload()?;
        self.profile.reload()?;
        self.orders.reload()?;
        Ok(())
    }

    fn sync_service(&self) -> SyncResult<&SyncService> {
        self.sync
            .as_deref()
            .ok_or(SyncError::Client(ClientError::NotConfigured("base URL")))
    }

    /// 关联远程客户 (按邮箱查找，不存在则创建)
    pub async fn link_customer(&self) -> SyncResult<CustomerSnapshot> {
        let sync = self.sync_service()?;
        if let Some(linked) = self.session.customer()
            && linked.remote_customer_id.is_some()
        {
            return Ok(linked);
        }
        let snapshot = self
            .profile
            .customer_snapshot()
            .ok_or(SyncError::NotSignedIn)?;
        sync.link_customer(&snapshot)
            .await
            .inspect_err(|e| self.notifier.warning(e.code(), e.to_string()))
    }

    /// 推送未同步订单并拉取远程订单
    pub async fn sync_orders(&self) -> SyncResult<SyncReport> {
        self.sync_service()?
            .sync_all()
            .await
            .inspect_err(|e| self.notifier.warning(e.code(), e.to_string()))
    }

    // ========== Checkout ==========

    /// Delivery details from a saved address (default address when `None`)
    pub fn delivery_from_address(
        &self,
        address_id: Option<&str>,
        delivery_time: DeliveryTime,
    ) -> Option<DeliveryDetails> {
        let profile = self.profile.profile()?;
        let address = match address_id {
            Some(id) => profile.address(id),
            None => profile.default_address(),
        }?;
        Some(address.to_delivery(&profile.display_name, delivery_time))
    }

    /// 下单: 本地创建，然后尽力推送到远程平台
    ///
    /// A failed push leaves the order unsynced for the next
    /// [`sync_orders`](Self::sync_orders).
    pub async fn checkout(&self, details: DeliveryDetails) -> ManagerResult<Order> {
        let order = self.orders.create_order(details)?;

        let Some(sync) = self.sync.as_deref() else {
            return Ok(order);
        };
        match sync.push_order(&order.id).await {
            Ok(remote_id) => {
                tracing::info!(order_id = %order.id, remote_id, "Order synced at checkout");
                Ok(self.orders.get_order(&order.id).unwrap_or(order))
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Order kept local, sync pending");
                self.notifier
                    .warning(e.code(), format!("Order {} saved, sync pending", order.id));
                Ok(order)
            }
        }
    }

    // ========== Order transitions (local first, remote in background) ==========

    pub fn cancel_order(&self, order_id: &str) -> ManagerResult<Order> {
        let order = self.orders.cancel_order(order_id)?;
        self.push_status(&order);
        Ok(order)
    }

    pub fn confirm_order(
        &self,
        order_id: &str,
        method: PaymentMethod,
        details: Option<PaymentDetails>,
    ) -> ManagerResult<Order> {
        let order = self.orders.confirm_order(order_id, method, details)?;
        self.push_status(&order);
        Ok(order)
    }

    pub fn update_order_status(&self, order_id: &str, status: OrderStatus) -> ManagerResult<Order> {
        let order = self.orders.update_order_status(order_id, status)?;
        self.push_status(&order);
        Ok(order)
    }

    pub fn update_payment_status(
        &self,
        order_id: &str,
        payment_status: PaymentStatus,
        details: Option<PaymentDetails>,
    ) -> ManagerResult<Order> {
        let order = self
            .orders
            .update_payment_status(order_id, payment_status, details)?;
        self.push_status(&order);
        Ok(order)
    }

    fn push_status(&self, order: &Order) {
        if let Some(sync) = &self.sync {
            // 后台推送，不等待结果
            let _ = sync.spawn_status_push(order);
        }
    }
}
