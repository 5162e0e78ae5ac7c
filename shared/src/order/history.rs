//! Status history maintenance
//!
//! The persisted history holds at most one entry per status. When two
//! entries share a status the later timestamp wins, and the result is
//! ordered chronologically by timestamp (ties keep first-seen order).

use super::types::{OrderStatus, StatusEntry};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Collapse duplicate statuses, keeping the latest timestamp of each
pub fn dedup_history(entries: &[StatusEntry]) -> Vec<StatusEntry> {
    let mut positions: HashMap<OrderStatus, usize> = HashMap::with_capacity(entries.len());
    let mut deduped: Vec<StatusEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match positions.get(&entry.status) {
            Some(&idx) => {
                if entry.timestamp > deduped[idx].timestamp {
                    deduped[idx].timestamp = entry.timestamp;
                }
            }
            None => {
                positions.insert(entry.status, deduped.len());
                deduped.push(*entry);
            }
        }
    }

    // stable: equal timestamps keep first-seen order
    deduped.sort_by_key(|e| e.timestamp);
    deduped
}

/// Append a transition and re-apply the dedup rule
pub fn record_status(history: &mut Vec<StatusEntry>, status: OrderStatus, at: DateTime<Utc>) {
    history.push(StatusEntry::new(status, at));
    *history = dedup_history(history);
}

/// Union of two histories for the same order.
///
/// The side with strictly more entries is primary (`remote` on ties); the
/// other side only contributes statuses the primary does not have. More
/// entries is used as a proxy for the richer history; it is a heuristic,
/// not a causal ordering.
pub fn merge_histories(local: &[StatusEntry], remote: &[StatusEntry]) -> Vec<StatusEntry> {
    let local = dedup_history(local);
    let remote = dedup_history(remote);

    let (primary, secondary) = if local.len() > remote.len() {
        (local, remote)
    } else {
        (remote, local)
    };

    let mut merged = primary;
    for entry in secondary {
        if !merged.iter().any(|e| e.status == entry.status) {
            merged.push(entry);
        }
    }
    dedup_history(&merged)
}

/// Statuses in history order
pub fn statuses(history: &[StatusEntry]) -> Vec<OrderStatus> {
    history.iter().map(|e| e.status).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn entry(status: OrderStatus, minutes: i64) -> StatusEntry {
        StatusEntry::new(status, at(minutes))
    }

    #[test]
    fn test_dedup_keeps_latest_timestamp() {
        let history = vec![
            entry(OrderStatus::Pending, 0),
            entry(OrderStatus::Pending, 5),
        ];
        let deduped = dedup_history(&history);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].timestamp, at(5));
    }

    #[test]
    fn test_dedup_orders_by_timestamp() {
        // processing recorded twice; the later copy moves it after shipped
        let history = vec![
            entry(OrderStatus::Pending, 0),
            entry(OrderStatus::Processing, 1),
            entry(OrderStatus::Shipped, 2),
            entry(OrderStatus::Processing, 3),
        ];
        let deduped = dedup_history(&history);
        assert_eq!(
            statuses(&deduped),
            vec![
                OrderStatus::Pending,
                OrderStatus::Shipped,
                OrderStatus::Processing
            ]
        );
    }

    #[test]
    fn test_dedup_earlier_duplicate_is_ignored() {
        let history = vec![
            entry(OrderStatus::Confirmed, 10),
            entry(OrderStatus::Confirmed, 2),
        ];
        let deduped = dedup_history(&history);
        assert_eq!(deduped, vec![entry(OrderStatus::Confirmed, 10)]);
    }

    #[test]
    fn test_record_status_appends() {
        let mut history = vec![entry(OrderStatus::Pending, 0)];
        record_status(&mut history, OrderStatus::Confirmed, at(1));
        assert_eq!(
            statuses(&history),
            vec![OrderStatus::Pending, OrderStatus::Confirmed]
        );

        record_status(&mut history, OrderStatus::Confirmed, at(2));
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].timestamp, at(2));
    }

    #[test]
    fn test_merge_prefers_longer_local_history() {
        let local = vec![
            entry(OrderStatus::Pending, 0),
            entry(OrderStatus::Confirmed, 1),
            entry(OrderStatus::Shipped, 5),
        ];
        let remote = vec![entry(OrderStatus::Processing, 0)];

        let merged = merge_histories(&local, &remote);
        assert_eq!(
            statuses(&merged),
            vec![
                OrderStatus::Pending,
                OrderStatus::Processing,
                OrderStatus::Confirmed,
                OrderStatus::Shipped
            ]
        );
    }

    #[test]
    fn test_merge_tie_favors_remote_timestamps() {
        let local = vec![entry(OrderStatus::Pending, 3)];
        let remote = vec![entry(OrderStatus::Pending, 0)];

        let merged = merge_histories(&local, &remote);
        assert_eq!(merged, vec![entry(OrderStatus::Pending, 0)]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let local = vec![
            entry(OrderStatus::Pending, 0),
            entry(OrderStatus::Confirmed, 1),
        ];
        let remote = vec![entry(OrderStatus::Processing, 4)];

        let once = merge_histories(&local, &remote);
        let twice = merge_histories(&once, &remote);
        assert_eq!(once, twice);
    }
}
