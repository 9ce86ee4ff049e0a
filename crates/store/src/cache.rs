//! TTL-bounded snapshot cache in front of a record store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gardenkeep_model::Record;
use tokio::sync::Mutex;

use crate::{RecordStore, StoreError};

/// Caches the candidate snapshot handed to the resolver.
///
/// Readers get an immutable `Arc` snapshot. The write-completion path must
/// call [`invalidate`](Self::invalidate) so resolution never runs against
/// data older than one TTL.
pub struct SnapshotCache<S> {
    store: S,
    ttl: Duration,
    cached: Mutex<Option<(Instant, Arc<Vec<Record>>)>>,
}

impl<S: RecordStore + Sync> SnapshotCache<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cached: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current snapshot, refreshed from the store when stale or invalidated.
    pub async fn snapshot(&self) -> Result<Arc<Vec<Record>>, StoreError> {
        let mut cached = self.cached.lock().await;

        if let Some((fetched_at, records)) = cached.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(records));
            }
        }

        let records = Arc::new(self.store.list_records().await?);
        tracing::debug!(
            store = self.store.name(),
            records = records.len(),
            "Refreshed record snapshot"
        );
        *cached = Some((Instant::now(), Arc::clone(&records)));
        Ok(records)
    }

    /// Drop the cached snapshot; the next read goes to the store.
    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        if cached.take().is_some() {
            tracing::debug!(store = self.store.name(), "Invalidated record snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        calls: AtomicUsize,
    }

    impl RecordStore for CountingStore {
        async fn list_records(&self) -> Result<Vec<Record>, StoreError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Record::new(0).with("Plant Name", format!("Fetch {n}"))])
        }

        async fn schema_headers(&self) -> Result<Vec<String>, StoreError> {
            Ok(vec!["Plant Name".to_string()])
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn counting() -> CountingStore {
        CountingStore {
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_snapshot_is_cached_within_ttl() {
        let cache = SnapshotCache::new(counting(), Duration::from_secs(60));
        let first = cache.snapshot().await.unwrap();
        let second = cache.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.store().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let cache = SnapshotCache::new(counting(), Duration::from_secs(60));
        let first = cache.snapshot().await.unwrap();
        cache.invalidate().await;
        let second = cache.snapshot().await.unwrap();

        assert_eq!(cache.store().calls.load(Ordering::SeqCst), 2);
        assert_eq!(first[0].text("Plant Name").as_deref(), Some("Fetch 0"));
        assert_eq!(second[0].text("Plant Name").as_deref(), Some("Fetch 1"));
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refreshes() {
        let cache = SnapshotCache::new(counting(), Duration::ZERO);
        cache.snapshot().await.unwrap();
        cache.snapshot().await.unwrap();
        assert_eq!(cache.store().calls.load(Ordering::SeqCst), 2);
    }
}
