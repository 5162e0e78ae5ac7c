//! User profile and address book service

use parking_lot::RwLock;
use shared::models::{Address, AddressCreate, AddressUpdate, CustomerSnapshot, Profile, ProfileUpdate};

use super::{Notifier, ServiceError, ServiceResult, SessionHandle};
use crate::storage::{RecordKind, RecordStorage};

/// Profile of the signed-in user
#[derive(Debug)]
pub struct ProfileManager {
    storage: RecordStorage,
    session: SessionHandle,
    notifier: Notifier,
    /// `None` while signed out
    profile: RwLock<Option<Profile>>,
}

impl ProfileManager {
    pub fn new(
        storage: RecordStorage,
        session: SessionHandle,
        notifier: Notifier,
    ) -> ServiceResult<Self> {
        let manager = Self {
            storage,
            session,
            notifier,
            profile: RwLock::new(None),
        };
        manager.reload()?;
        Ok(manager)
    }

    /// Load the signed-in user's profile, starting a blank one on first use
    pub fn reload(&self) -> ServiceResult<()> {
        let profile = match self.session.current() {
            Some(session) => {
                let stored: Option<Profile> =
                    self.storage.load(&session.user_id, RecordKind::Profile)?;
                let profile = stored.unwrap_or_else(|| {
                    let mut fresh = Profile::new(&session.user_id);
                    fresh.email = session.email.clone();
                    fresh
                });
                Some(profile.normalized())
            }
            None => None,
        };
        *self.profile.write() = profile;
        Ok(())
    }

    pub fn profile(&self) -> Option<Profile> {
        self.profile.read().clone()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.profile
            .read()
            .as_ref()
            .map(|p| p.addresses.clone())
            .unwrap_or_default()
    }

    pub fn default_address(&self) -> Option<Address> {
        self.profile
            .read()
            .as_ref()
            .and_then(|p| p.default_address().cloned())
    }

    /// Customer details for the remote platform
    pub fn customer_snapshot(&self) -> Option<CustomerSnapshot> {
        self.profile
            .read()
            .as_ref()
            .map(|p| CustomerSnapshot::from_display_name(&p.display_name, &p.email, &p.phone))
    }

    /// Update contact fields
    pub fn update(&self, update: ProfileUpdate) -> ServiceResult<Profile> {
        if update.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return self.fail(ServiceError::Validation("email cannot be blank".into()));
        }
        self.mutate(|profile| {
            profile.apply(update);
            Ok(profile.clone())
        })
    }

    pub fn add_address(&self, input: AddressCreate) -> ServiceResult<Address> {
        if input.full_address.trim().is_empty() || input.city.trim().is_empty() {
            return self.fail(ServiceError::Validation(
                "address and city are required".into(),
            ));
        }
        self.mutate(|profile| Ok(profile.add_address(input)))
    }

    pub fn update_address(&self, id: &str, update: AddressUpdate) -> ServiceResult<Address> {
        self.mutate(|profile| {
            profile
                .update_address(id, update)
                .ok_or_else(|| ServiceError::AddressNotFound(id.to_string()))
        })
    }

    /// Remove an address; another one is promoted if it was the default
    pub fn remove_address(&self, id: &str) -> ServiceResult<Address> {
        self.mutate(|profile| {
            profile
                .remove_address(id)
                .ok_or_else(|| ServiceError::AddressNotFound(id.to_string()))
        })
    }

    pub fn set_default_address(&self, id: &str) -> ServiceResult<()> {
        self.mutate(|profile| {
            if profile.set_default(id) {
                Ok(())
            } else {
                Err(ServiceError::AddressNotFound(id.to_string()))
            }
        })
    }

    fn fail<T>(&self, err: ServiceError) -> ServiceResult<T> {
        err.report(&self.notifier);
        Err(err)
    }

    fn mutate<R>(
        &self,
        change: impl FnOnce(&mut Profile) -> ServiceResult<R>,
    ) -> ServiceResult<R> {
        self.apply(change)
            .inspect_err(|e| e.report(&self.notifier))
    }

    fn apply<R>(&self, change: impl FnOnce(&mut Profile) -> ServiceResult<R>) -> ServiceResult<R> {
        let mut guard = self.profile.write();
        let current = guard.as_ref().ok_or(ServiceError::NotSignedIn)?;
        let mut next = current.clone();
        let result = change(&mut next)?;
        self.storage.save(&next.user_id, RecordKind::Profile, &next)?;
        *guard = Some(next);
        Ok(result)
    }
}
