//! Descriptor cache using moka
//!
//! Descriptor lists are reference data: fetched per doctype, never mutated
//! locally, only re-fetched. The cache keeps them for a TTL and drops them
//! when a mutation could have changed their resolved option lists.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use doctype_meta::{DoctypeInfo, FieldDescriptor, FieldType, ListPage, ListQuery, OptionItem, Record};

use crate::api::DoctypeApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Cache key: doctype plus the requested field subset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InfoKey {
    /// Doctype name
    pub doctype: String,
    /// Requested fields (empty = all)
    pub fields: Vec<String>,
}

impl InfoKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(doctype: impl Into<String>, fields: &[String]) -> Self {
        Self {
            doctype: doctype.into(),
            fields: fields.to_vec(),
        }
    }
}

/// Concurrent cache of descriptor lists
#[derive(Debug, Clone)]
pub struct InfoCache {
    inner: Cache<InfoKey, Arc<DoctypeInfo>>,
}

impl InfoCache {
    /// Create cache with capacity and time-to-live
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Cache sized from client configuration
    #[inline]
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.cache_capacity, config.cache_ttl())
    }

    /// Cached descriptors
    #[inline]
    pub async fn get(&self, key: &InfoKey) -> Option<Arc<DoctypeInfo>> {
        self.inner.get(key).await
    }

    /// Store descriptors
    #[inline]
    pub async fn insert(&self, key: InfoKey, info: Arc<DoctypeInfo>) {
        self.inner.insert(key, info).await;
    }

    /// Get cached descriptors or fetch and store them
    ///
    /// Concurrent callers of a missing key wait on a single fetch. A failed
    /// fetch is not cached.
    ///
    /// # Errors
    /// The fetch error; waiters other than the first share it.
    pub async fn try_get_or_fetch<F, Fut>(&self, key: InfoKey, fetch: F) -> Result<Arc<DoctypeInfo>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<DoctypeInfo>>,
    {
        let fetched = async move { fetch().await.map(Arc::new) };
        self.inner.try_get_with(key, fetched).await.map_err(ClientError::from)
    }

    /// Drop every entry of a doctype
    pub fn invalidate_doctype(&self, doctype: &str) {
        let doctype = doctype.to_string();
        if let Err(e) = self.inner.invalidate_entries_if(move |key, _| key.doctype == doctype) {
            tracing::warn!("Cache invalidation failed: {}", e);
            self.inner.invalidate_all();
        }
    }

    /// Drop entries whose Link fields resolve options from `target`
    ///
    /// Entries with a Dynamic Link are dropped too: its target doctype is
    /// only known from form values, so it may be `target`.
    pub fn invalidate_linking_to(&self, target: &str) {
        let target = target.to_string();
        let result = self.inner.invalidate_entries_if(move |_, info| {
            let links_to = |f: &FieldDescriptor| {
                f.fieldtype == FieldType::DynamicLink || f.link_target() == Some(target.as_str())
            };
            info.fields
                .iter()
                .any(|f| links_to(f) || f.sub_fields.iter().any(links_to))
        });
        if let Err(e) = result {
            tracing::warn!("Cache invalidation failed: {}", e);
            self.inner.invalidate_all();
        }
    }

    /// Drop everything
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for InfoCache {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// [`DoctypeApi`] wrapper serving descriptors from an [`InfoCache`]
#[derive(Debug, Clone)]
pub struct CachedDoctypeApi<A> {
    inner: A,
    cache: InfoCache,
}

impl<A: DoctypeApi> CachedDoctypeApi<A> {
    /// Wrap an API with a cache
    #[inline]
    #[must_use]
    pub fn new(inner: A, cache: InfoCache) -> Self {
        Self { inner, cache }
    }

    /// Wrapped API
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Descriptor cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &InfoCache {
        &self.cache
    }
}

#[async_trait::async_trait]
impl<A: DoctypeApi> DoctypeApi for CachedDoctypeApi<A> {
    async fn list_info(&self, doctype: &str, fields: &[String]) -> Result<DoctypeInfo> {
        let key = InfoKey::new(doctype, fields);
        let info = self
            .cache
            .try_get_or_fetch(key, || self.inner.list_info(doctype, fields))
            .await?;
        Ok((*info).clone())
    }

    async fn list_data(&self, query: &ListQuery) -> Result<ListPage> {
        self.inner.list_data(query).await
    }

    async fn single_data(&self, doctype: &str, id: &str) -> Result<Record> {
        self.inner.single_data(doctype, id).await
    }

    async fn create(&self, doctype: &str, record: &Record) -> Result<Record> {
        let created = self.inner.create(doctype, record).await?;
        self.cache.invalidate_linking_to(doctype);
        Ok(created)
    }

    async fn update(&self, doctype: &str, id: &str, record: &Record) -> Result<Record> {
        let updated = self.inner.update(doctype, id, record).await?;
        self.cache.invalidate_linking_to(doctype);
        Ok(updated)
    }

    async fn delete(&self, doctype: &str, ids: &[String]) -> Result<()> {
        self.inner.delete(doctype, ids).await?;
        self.cache.invalidate_linking_to(doctype);
        Ok(())
    }

    async fn link_options(&self, doctype: &str) -> Result<Vec<OptionItem>> {
        self.inner.link_options(doctype).await
    }

    async fn invalidate_info(&self, doctype: &str) {
        self.cache.invalidate_doctype(doctype);
        self.inner.invalidate_info(doctype).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn info(target: &str) -> DoctypeInfo {
        DoctypeInfo::new(vec![
            FieldDescriptor::new("customer", FieldType::Link).with_options(target),
        ])
    }

    #[tokio::test]
    async fn fetches_once_per_key() {
        let cache = InfoCache::new(16, Duration::from_secs(60));
        let key = InfoKey::new("Lead", &[]);
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        for _ in 0..3 {
            let fetched = cache
                .try_get_or_fetch(key.clone(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(info("Customer"))
                })
                .await
                .unwrap();
            assert_eq!(fetched.fields.len(), 1);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_by_doctype_and_link_target() {
        let cache = InfoCache::new(16, Duration::from_secs(60));
        let lead = InfoKey::new("Lead", &[]);
        let plot = InfoKey::new("Plot Detail", &["plot_no".to_string()]);
        cache.insert(lead.clone(), Arc::new(info("Customer"))).await;
        cache.insert(plot.clone(), Arc::new(info("Project"))).await;

        cache.invalidate_linking_to("Customer");
        assert!(cache.get(&lead).await.is_none());
        assert!(cache.get(&plot).await.is_some());

        cache.invalidate_doctype("Plot Detail");
        assert!(cache.get(&plot).await.is_none());
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let cache = InfoCache::new(16, Duration::from_secs(60));
        let key = InfoKey::new("Lead", &[]);
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = || {
            cache.try_get_or_fetch(key.clone(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(info("Customer"))
            })
        };
        let (a, b, c) = tokio::join!(fetch(), fetch(), fetch());
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dynamic_links_are_invalidated_by_any_mutation() {
        let cache = InfoCache::new(16, Duration::from_secs(60));
        let lead = InfoKey::new("Lead", &[]);
        let dynamic = DoctypeInfo::new(vec![
            FieldDescriptor::new("party_type", FieldType::Link).with_options("DocType"),
            FieldDescriptor::new("party", FieldType::DynamicLink).with_options("party_type"),
        ]);
        cache.insert(lead.clone(), Arc::new(dynamic)).await;
        cache.insert(InfoKey::new("Plot Detail", &[]), Arc::new(info("Project"))).await;

        cache.invalidate_linking_to("Supplier");
        assert!(cache.get(&lead).await.is_none());
        assert!(cache.get(&InfoKey::new("Plot Detail", &[])).await.is_some());
    }

    #[test]
    fn shared_errors_keep_status_and_message() {
        let original = ClientError::Status {
            status: 404,
            message: "not found".into(),
            body: Some(serde_json::json!({"message": "DocType Lead not found"})),
        };
        let shared = Arc::new(original);
        let _waiter = Arc::clone(&shared);
        let err = ClientError::from(shared);
        assert!(matches!(err, ClientError::Shared(_)));
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.user_message(), "DocType Lead not found");
    }

    #[tokio::test]
    async fn fetch_error_is_not_cached() {
        let cache = InfoCache::default();
        let key = InfoKey::new("Lead", &[]);
        let err = cache
            .try_get_or_fetch(key.clone(), || async { Err(ClientError::Decode("boom".into())) })
            .await;
        assert!(err.is_err());
        assert!(cache.get(&key).await.is_none());
    }
}
