//! Signed-in session state

use parking_lot::RwLock;
use shared::models::CustomerSnapshot;
use std::sync::Arc;

/// Owner key used for the cart while nobody is signed in
pub const GUEST_OWNER: &str = "guest";

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    /// Remote customer link, filled once resolved
    pub customer: Option<CustomerSnapshot>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            customer: None,
        }
    }

    pub fn with_customer(mut self, customer: CustomerSnapshot) -> Self {
        self.customer = Some(customer);
        self
    }
}

/// Shared, injectable handle to the current session
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle already signed in (tests, restored sessions)
    pub fn signed_in(session: Session) -> Self {
        let handle = Self::new();
        handle.sign_in(session);
        handle
    }

    pub fn sign_in(&self, session: Session) {
        *self.inner.write() = Some(session);
    }

    pub fn sign_out(&self) -> Option<Session> {
        self.inner.write().take()
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.read().is_some()
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.read().as_ref().map(|s| s.user_id.clone())
    }

    /// Storage owner: the user id, or [`GUEST_OWNER`]
    pub fn owner_key(&self) -> String {
        self.user_id().unwrap_or_else(|| GUEST_OWNER.to_string())
    }

    pub fn customer(&self) -> Option<CustomerSnapshot> {
        self.inner.read().as_ref().and_then(|s| s.customer.clone())
    }

    /// Attach the remote customer link to `user_id`'s session.
    ///
    /// False when signed out or when someone else is signed in now.
    pub fn set_customer(&self, user_id: &str, customer: CustomerSnapshot) -> bool {
        match self.inner.write().as_mut() {
            Some(session) if session.user_id == user_id => {
                session.customer = Some(customer);
                true
            }
            _ => false,
        }
    }
}
