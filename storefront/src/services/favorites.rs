//! Favorites service

use parking_lot::RwLock;
use shared::models::{Favorite, Favorites};

use super::{Notifier, ServiceError, ServiceResult, SessionHandle};
use crate::storage::{RecordKind, RecordStorage};

#[derive(Debug, Default)]
struct FavoritesState {
    /// `None` while signed out
    owner: Option<String>,
    favorites: Favorites,
}

/// Favorite products of the signed-in user
#[derive(Debug)]
pub struct FavoritesManager {
    storage: RecordStorage,
    session: SessionHandle,
    notifier: Notifier,
    state: RwLock<FavoritesState>,
}

impl FavoritesManager {
    pub fn new(
        storage: RecordStorage,
        session: SessionHandle,
        notifier: Notifier,
    ) -> ServiceResult<Self> {
        let manager = Self {
            storage,
            session,
            notifier,
            state: RwLock::new(FavoritesState::default()),
        };
        manager.reload()?;
        Ok(manager)
    }

    pub fn reload(&self) -> ServiceResult<()> {
        let owner = self.session.user_id();
        let favorites = match &owner {
            Some(user_id) => self
                .storage
                .load(user_id, RecordKind::Favorites)?
                .unwrap_or_default(),
            None => Favorites::default(),
        };
        *self.state.write() = FavoritesState { owner, favorites };
        Ok(())
    }

    pub fn list(&self) -> Vec<Favorite> {
        self.state.read().favorites.items.clone()
    }

    pub fn contains(&self, product_id: u64) -> bool {
        self.state.read().favorites.contains(product_id)
    }

    /// Add or remove; returns true when the product is now a favorite
    pub fn toggle(&self, product_id: u64, name: &str) -> ServiceResult<bool> {
        let added = self.mutate(|f| f.toggle(product_id, name, shared::util::now()))?;
        if added {
            self.notifier.success(format!("{} added to favorites", name));
        }
        Ok(added)
    }

    pub fn remove(&self, product_id: u64) -> ServiceResult<bool> {
        self.mutate(|f| f.remove(product_id))
    }

    fn mutate<R>(&self, change: impl FnOnce(&mut Favorites) -> R) -> ServiceResult<R> {
        self.apply(change)
            .inspect_err(|e| e.report(&self.notifier))
    }

    fn apply<R>(&self, change: impl FnOnce(&mut Favorites) -> R) -> ServiceResult<R> {
        let mut state = self.state.write();
        let owner = state.owner.clone().ok_or(ServiceError::NotSignedIn)?;
        let mut next = state.favorites.clone();
        let result = change(&mut next);
        self.storage.save(&owner, RecordKind::Favorites, &next)?;
        state.favorites = next;
        Ok(result)
    }
}
