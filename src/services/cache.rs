use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::SalonCatalogEntry;

use super::{SalonCatalog, StoreError};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// Implements L1 (in-memory) and optional L2 (Redis) caching.
/// L1 is fastest but local to the process, L2 is shared across instances.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// Create a process-local cache manager without Redis
    pub fn local(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
        moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build()
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let Some(l2) = &self.redis else {
            tracing::trace!("Cache miss: {}", key);
            return Err(CacheError::CacheMiss(key.to_string()));
        };

        let mut conn = l2.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        if let Some(json) = value {
            tracing::trace!("L2 cache hit: {}", key);

            // Populate L1 cache
            self.l1_cache
                .insert(key.to_string(), json.as_bytes().to_vec())
                .await;

            return Ok(serde_json::from_str(&json)?);
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both tiers)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(l2) = &self.redis {
            let mut conn = l2.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from both cache tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;
        if let Some(l2) = &self.redis {
            let mut conn = l2.lock().await;
            redis::cmd("DEL")
                .arg(key)
                .query_async::<()>(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_size: self.l1_cache.entry_count(),
            redis_enabled: self.redis.is_some(),
            ttl_secs: self.ttl_secs,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub l1_size: u64,
    pub redis_enabled: bool,
    pub ttl_secs: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for the full salon catalog projection
    pub fn catalog() -> String {
        "catalog:salons".to_string()
    }

    /// Build a cache key for a single salon
    pub fn salon(salon_id: &str) -> String {
        format!("salon:{}", salon_id)
    }
}

/// Salon catalog that serves reads from `CacheManager` when possible.
///
/// Cache failures never fail a read; they are logged and the inner catalog
/// answers instead.
pub struct CachedCatalog {
    inner: Arc<dyn SalonCatalog>,
    cache: Arc<CacheManager>,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn SalonCatalog>, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }

    /// Drop cached catalog data, e.g. after a salon was edited
    pub async fn invalidate(&self, salon_id: Option<&str>) {
        if let Err(e) = self.cache.delete(&CacheKey::catalog()).await {
            tracing::warn!("Failed to invalidate catalog cache: {}", e);
        }
        if let Some(id) = salon_id {
            if let Err(e) = self.cache.delete(&CacheKey::salon(id)).await {
                tracing::warn!("Failed to invalidate salon cache for {}: {}", id, e);
            }
        }
    }

    async fn read_through<T, F, Fut>(&self, key: String, load: F) -> Result<T, StoreError>
    where
        T: Serialize + for<'de> Deserialize<'de>,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        match self.cache.get::<T>(&key).await {
            Ok(value) => return Ok(value),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Cache read failed for {}, using store: {}", key, e),
        }

        let value = load().await?;
        if let Err(e) = self.cache.set(&key, &value).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
        Ok(value)
    }
}

#[async_trait]
impl SalonCatalog for CachedCatalog {
    async fn all_salons(&self) -> Result<Vec<SalonCatalogEntry>, StoreError> {
        self.read_through(CacheKey::catalog(), || self.inner.all_salons())
            .await
    }

    async fn salon_by_id(&self, salon_id: &str) -> Result<Option<SalonCatalogEntry>, StoreError> {
        self.read_through(CacheKey::salon(salon_id), || self.inner.salon_by_id(salon_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryStore;

    fn create_salon(id: &str, price: f64) -> SalonCatalogEntry {
        SalonCatalogEntry {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            salon_name: format!("Salon {}", id),
            salon_image: None,
            location: None,
            price_range: Some(price),
            types_of_massages: vec!["Aromatherapy".to_string()],
            rating: Some(4.0),
            total_reviews: 2,
        }
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_set_get() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");

        let key = "test_key";
        let value = "test_value";

        cache.set(key, &value).await.unwrap();
        let result: String = cache.get(key).await.unwrap();
        assert_eq!(result, value);

        cache.delete(key).await.unwrap();
        assert!(cache.get::<String>(key).await.is_err());
    }

    #[tokio::test]
    async fn test_local_cache_round_trip() {
        let cache = CacheManager::local(100, 60);
        assert!(!cache.has_redis());

        cache.set("k", &vec![1, 2, 3]).await.unwrap();
        let value: Vec<i32> = cache.get("k").await.unwrap();
        assert_eq!(value, vec![1, 2, 3]);

        cache.delete("k").await.unwrap();
        assert!(matches!(cache.get::<Vec<i32>>("k").await, Err(CacheError::CacheMiss(_))));
    }

    #[tokio::test]
    async fn test_cached_catalog_serves_stale_until_invalidated() {
        let store = Arc::new(InMemoryStore::new());
        store.add_salon(create_salon("s1", 100.0)).await;

        let catalog = CachedCatalog::new(store.clone(), Arc::new(CacheManager::local(100, 60)));
        assert_eq!(catalog.all_salons().await.unwrap().len(), 1);

        store.add_salon(create_salon("s2", 200.0)).await;
        assert_eq!(catalog.all_salons().await.unwrap().len(), 1);

        catalog.invalidate(None).await;
        assert_eq!(catalog.all_salons().await.unwrap().len(), 2);

        let s2 = catalog.salon_by_id("s2").await.unwrap().unwrap();
        assert_eq!(s2.price_range, Some(200.0));
    }

    #[tokio::test]
    async fn test_cached_catalog_propagates_store_errors() {
        let store = Arc::new(InMemoryStore::new());
        store.set_unavailable(true);

        let catalog = CachedCatalog::new(store, Arc::new(CacheManager::local(100, 60)));
        assert!(catalog.all_salons().await.is_err());
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::catalog(), "catalog:salons");
        assert_eq!(CacheKey::salon("abc"), "salon:abc");
    }
}
