//! Time-bounded key-value store shared by all in-flight requests.
//!
//! Every entry carries its own ttl. Expired entries are never returned and are
//! evicted by moka in the background.

#[derive(Clone)]
struct Entry<V> {
    value: V,
    ttl: std::time::Duration,
}

/// Expires each entry `ttl` after it was last written. Reads do not extend the lifetime.
struct PerEntryTtl;

impl<V> moka::Expiry<String, Entry<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry<V>,
        _created_at: std::time::Instant,
    ) -> Option<std::time::Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry<V>,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<std::time::Duration>,
    ) -> Option<std::time::Duration> {
        Some(entry.ttl)
    }
}

/// Cloning is cheap and every clone shares the same storage.
#[derive(Clone)]
pub(crate) struct TtlCache<V> {
    inner: moka::future::Cache<String, Entry<V>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(max_entries: u64) -> Self {
        Self {
            inner: moka::future::Cache::builder()
                .max_capacity(max_entries)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    pub(crate) async fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).await.map(|entry| entry.value)
    }

    /// Stores or replaces `key`. A replaced entry gets a fresh ttl.
    pub(crate) async fn set(&self, key: impl Into<String>, value: V, ttl: std::time::Duration) {
        self.inner.insert(key.into(), Entry { value, ttl }).await;
    }

    /// Approximate, moka updates the count as it processes pending writes.
    pub(crate) fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
