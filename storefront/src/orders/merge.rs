//! Folding pulled remote orders into the local list
//!
//! # Rule
//!
//! ```text
//! for remote in pulled:
//!     local = find(id == remote.id || remote_id == remote.remote_id)
//!     found     → history = union (longer side primary, remote on ties)
//!                 other fields from remote, local id kept
//!     not found → append
//! local-only orders stay untouched
//! dedup by id, sort by created_at desc
//! ```
//!
//! Merging the same pull twice yields the same list as merging it once.

use shared::order::{Order, merge_histories};
use std::collections::HashSet;

/// What a merge changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Local orders whose fields changed
    pub updated: usize,
    /// Remote orders with no local counterpart
    pub added: usize,
    /// Matched orders already in sync
    pub unchanged: usize,
}

impl MergeSummary {
    pub fn changed(&self) -> bool {
        self.updated + self.added > 0
    }
}

fn matches(local: &Order, remote: &Order) -> bool {
    local.id == remote.id || (local.remote_id.is_some() && local.remote_id == remote.remote_id)
}

/// Combine one matched pair
pub fn merge_pair(local: &Order, remote: &Order) -> Order {
    let mut merged = remote.clone();
    merged.id = local.id.clone();
    merged.user_id = local.user_id.clone();
    merged.status_history = merge_histories(&local.status_history, &remote.status_history);
    merged.remote_id = remote.remote_id.or(local.remote_id);
    merged.transaction_id = remote
        .transaction_id
        .clone()
        .or_else(|| local.transaction_id.clone());
    if local.updated_at > merged.updated_at {
        merged.updated_at = local.updated_at;
    }
    merged
}

/// Fold `remote` into `local`; pulled orders are re-owned by `owner`
pub fn merge_orders(local: Vec<Order>, remote: Vec<Order>, owner: &str) -> (Vec<Order>, MergeSummary) {
    let mut merged = local;
    let mut summary = MergeSummary::default();

    for mut incoming in remote {
        incoming.user_id = owner.to_string();
        match merged.iter().position(|o| matches(o, &incoming)) {
            Some(idx) => {
                let combined = merge_pair(&merged[idx], &incoming);
                if combined == merged[idx] {
                    summary.unchanged += 1;
                } else {
                    summary.updated += 1;
                    merged[idx] = combined;
                }
            }
            None => {
                summary.added += 1;
                merged.push(incoming);
            }
        }
    }

    let mut seen = HashSet::with_capacity(merged.len());
    merged.retain(|o| seen.insert(o.id.clone()));
    sort_newest_first(&mut merged);
    (merged, summary)
}

/// Stable sort by `created_at` descending
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
