//! Remote order adapter

use async_trait::async_trait;
use shared::models::CustomerSnapshot;
use shared::order::{Order, OrderStatus, PaymentStatus};

use crate::mapping::{from_remote, to_remote_payload, to_status_update};
use crate::types::RemoteOrder;
use crate::{ClientError, ClientResult, WooClient};

/// Orders requested per page when pulling
pub const PAGE_SIZE: usize = 100;

/// Upper bound on pages fetched in one pull
pub const MAX_PAGES: u32 = 50;

/// Orders of one pull
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PulledOrders {
    pub orders: Vec<Order>,
    /// Records that failed to parse or normalize; logged and skipped
    pub rejected: usize,
}

/// Remote copy of the order list.
///
/// Implemented over HTTP by [`WooOrders`]; tests substitute in-memory fakes.
#[async_trait]
pub trait OrderRemote: Send + Sync {
    /// Create the order remotely, returning the remote id
    async fn push(&self, order: &Order, customer: &CustomerSnapshot) -> ClientResult<u64>;

    /// Fetch and normalize every order of a remote customer.
    ///
    /// An unexpected record is skipped and counted; it does not fail the pull.
    async fn pull(&self, remote_customer_id: u64) -> ClientResult<PulledOrders>;

    /// Propagate a status change
    async fn update_status(
        &self,
        remote_id: u64,
        status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> ClientResult<()>;
}

/// `/orders` endpoints
#[derive(Debug, Clone)]
pub struct WooOrders {
    client: WooClient,
}

impl WooOrders {
    pub fn new(client: WooClient) -> Self {
        Self { client }
    }

    /// Raw page; records are checked one by one in [`normalize_record`]
    async fn fetch_page(
        &self,
        remote_customer_id: u64,
        page: u32,
    ) -> ClientResult<Vec<serde_json::Value>> {
        let params = vec![
            ("customer".to_string(), remote_customer_id.to_string()),
            ("per_page".to_string(), PAGE_SIZE.to_string()),
            ("page".to_string(), page.to_string()),
        ];
        self.client.get("orders", &params).await
    }
}

#[async_trait]
impl OrderRemote for WooOrders {
    async fn push(&self, order: &Order, customer: &CustomerSnapshot) -> ClientResult<u64> {
        let payload = to_remote_payload(order, customer)?;
        let created: RemoteOrder = self.client.post("orders", &payload).await?;
        tracing::info!(order_id = %order.id, remote_id = created.id, "Order pushed");
        Ok(created.id)
    }

    async fn pull(&self, remote_customer_id: u64) -> ClientResult<PulledOrders> {
        let mut pulled = PulledOrders::default();

        for page in 1..=MAX_PAGES {
            let batch = self.fetch_page(remote_customer_id, page).await?;
            let short_page = batch.len() < PAGE_SIZE;
            for record in batch {
                let remote_id = record.get("id").and_then(serde_json::Value::as_u64);
                match normalize_record(record) {
                    Ok(order) => pulled.orders.push(order),
                    Err(e) => {
                        tracing::warn!(
                            remote_customer_id,
                            remote_id = ?remote_id,
                            error = %e,
                            "Skipping unexpected remote order"
                        );
                        pulled.rejected += 1;
                    }
                }
            }
            if short_page {
                break;
            }
            if page == MAX_PAGES {
                tracing::warn!(
                    remote_customer_id,
                    pages = MAX_PAGES,
                    "Order pull stopped at page limit"
                );
            }
        }

        tracing::debug!(
            remote_customer_id,
            count = pulled.orders.len(),
            rejected = pulled.rejected,
            "Orders pulled"
        );
        Ok(pulled)
    }

    async fn update_status(
        &self,
        remote_id: u64,
        status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> ClientResult<()> {
        let update = to_status_update(status, payment_status);
        let _: RemoteOrder = self
            .client
            .put(&format!("orders/{}", remote_id), &update)
            .await?;
        tracing::debug!(remote_id, status = %status, "Remote status updated");
        Ok(())
    }
}

fn normalize_record(record: serde_json::Value) -> ClientResult<Order> {
    let remote: RemoteOrder = serde_json::from_value(record)
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
    from_remote(&remote)
}
