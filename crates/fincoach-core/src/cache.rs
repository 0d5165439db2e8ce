//! Per-user snapshot cache
//!
//! Memoizes [`AnalysisSnapshot`]s keyed by user id and a data version. A
//! cached snapshot is only returned when the caller's version matches the one
//! it was computed from. Each user has its own lock: concurrent requests for
//! the same user compute at most once per version, and different users never
//! contend.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::analyzer::AnalysisSnapshot;
use crate::models::{Transaction, UserProfile};

struct CacheEntry {
    version: u64,
    snapshot: Arc<AnalysisSnapshot>,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Snapshot cache with per-key locking
#[derive(Default)]
pub struct SnapshotCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached snapshot for `user` if it was built from `version`,
    /// otherwise compute, store and return a fresh one.
    pub fn get_or_compute<F>(&self, user: &str, version: u64, compute: F) -> Arc<AnalysisSnapshot>
    where
        F: FnOnce() -> AnalysisSnapshot,
    {
        let slot = self.slot(user);
        let mut entry = slot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(cached) = entry.as_ref() {
            if cached.version == version {
                tracing::debug!(user, version, "Snapshot cache hit");
                return cached.snapshot.clone();
            }
        }

        tracing::debug!(user, version, "Snapshot cache miss");
        let snapshot = Arc::new(compute());
        *entry = Some(CacheEntry {
            version,
            snapshot: snapshot.clone(),
        });
        snapshot
    }

    /// Drop the entry for `user` (call when their transactions change)
    pub fn invalidate(&self, user: &str) {
        let removed = self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(user)
            .is_some();
        if removed {
            tracing::debug!(user, "Snapshot cache entry invalidated");
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, user: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(user.to_string()).or_default().clone()
    }
}

/// Version of every input a snapshot is built from.
///
/// Changes whenever a transaction is added, removed or edited, when the
/// currency changes, and whenever `now` moves at all. The 24h window is a
/// rolling one, so two requests on the same day can still see different
/// windows.
pub fn data_version(
    transactions: &[Transaction],
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    now.timestamp().hash(&mut hasher);
    now.timestamp_subsec_nanos().hash(&mut hasher);
    profile.currency.hash(&mut hasher);
    transactions.len().hash(&mut hasher);
    for tx in transactions {
        tx.amount.to_bits().hash(&mut hasher);
        tx.category.hash(&mut hasher);
        tx.date.timestamp_millis().hash(&mut hasher);
        tx.description.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snap(total: f64) -> AnalysisSnapshot {
        AnalysisSnapshot {
            total_spent: total,
            ..Default::default()
        }
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = SnapshotCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_compute("alice", 1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            snap(10.0)
        });
        let second = cache.get_or_compute("alice", 1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            snap(99.0)
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));

        let third = cache.get_or_compute("alice", 2, || snap(20.0));
        assert_eq!(third.total_spent, 20.0);
    }

    #[test]
    fn test_invalidate() {
        let cache = SnapshotCache::new();
        cache.get_or_compute("bob", 1, || snap(1.0));
        assert_eq!(cache.len(), 1);

        cache.invalidate("bob");
        assert!(cache.is_empty());

        let fresh = cache.get_or_compute("bob", 1, || snap(2.0));
        assert_eq!(fresh.total_spent, 2.0);
    }

    #[test]
    fn test_concurrent_same_user_computes_once() {
        let cache = SnapshotCache::new();
        let calls = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    cache.get_or_compute("carol", 7, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(20));
                        snap(5.0)
                    })
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_data_version_tracks_changes() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let profile = UserProfile::default();
        let txs = vec![Transaction::new(10.0, Category::Food, "lunch", now)];
        let v1 = data_version(&txs, &profile, now);

        assert_eq!(v1, data_version(&txs, &profile, now));
        assert_ne!(v1, data_version(&txs, &profile, now + Duration::hours(1)));
        assert_ne!(v1, data_version(&txs, &profile, now + Duration::days(1)));

        let mut edited = txs.clone();
        edited[0].amount = 11.0;
        assert_ne!(v1, data_version(&edited, &profile, now));

        let rupees = UserProfile {
            currency: "₹".to_string(),
            ..UserProfile::default()
        };
        assert_ne!(v1, data_version(&txs, &rupees, now));
    }
}
