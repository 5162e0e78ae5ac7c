//! Remote customer lookup

use async_trait::async_trait;
use shared::models::CustomerSnapshot;

use crate::types::{RemoteAddress, RemoteCustomer, RemoteCustomerPayload};
use crate::{ClientError, ClientResult, WooClient};

/// Remote customer directory
#[async_trait]
pub trait CustomerRemote: Send + Sync {
    /// Return the snapshot with `remote_customer_id` filled
    async fn ensure(&self, snapshot: &CustomerSnapshot) -> ClientResult<CustomerSnapshot>;
}

/// `/customers` endpoints
#[derive(Debug, Clone)]
pub struct WooCustomers {
    client: WooClient,
}

impl WooCustomers {
    pub fn new(client: WooClient) -> Self {
        Self { client }
    }

    /// Exact (case-insensitive) email match
    pub async fn find_by_email(&self, email: &str) -> ClientResult<Option<RemoteCustomer>> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ClientError::Validation("customer email is required".into()));
        }
        let params = vec![("email".to_string(), email.to_string())];
        let found: Vec<RemoteCustomer> = self.client.get("customers", &params).await?;
        Ok(found
            .into_iter()
            .find(|c| shared::util::same_text(&c.email, email)))
    }

    /// Create a remote customer from the snapshot
    pub async fn create(&self, snapshot: &CustomerSnapshot) -> ClientResult<RemoteCustomer> {
        if snapshot.email.trim().is_empty() {
            return Err(ClientError::Validation("customer email is required".into()));
        }
        let payload = RemoteCustomerPayload {
            email: snapshot.email.trim().to_string(),
            first_name: snapshot.first_name.clone(),
            last_name: snapshot.last_name.clone(),
            billing: RemoteAddress {
                first_name: snapshot.first_name.clone(),
                last_name: snapshot.last_name.clone(),
                email: snapshot.email.trim().to_string(),
                phone: snapshot.phone.clone(),
                ..Default::default()
            },
        };
        let created: RemoteCustomer = self.client.post("customers", &payload).await?;
        tracing::info!(remote_customer_id = created.id, "Remote customer created");
        Ok(created)
    }

}

#[async_trait]
impl CustomerRemote for WooCustomers {
    /// Creates the remote customer when no email match exists
    async fn ensure(&self, snapshot: &CustomerSnapshot) -> ClientResult<CustomerSnapshot> {
        if snapshot.remote_customer_id.is_some() {
            return Ok(snapshot.clone());
        }
        let remote = match self.find_by_email(&snapshot.email).await? {
            Some(existing) => existing,
            None => self.create(snapshot).await?,
        };
        Ok(CustomerSnapshot {
            remote_customer_id: Some(remote.id),
            ..snapshot.clone()
        })
    }
}
