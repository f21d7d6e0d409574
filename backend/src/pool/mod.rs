pub mod memory;
pub mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::{CandidateView, GeoPoint, PoolEntry};
use crate::utils::config::{Config, PoolBackend};

pub use memory::MemoryPool;
pub use redis_store::RedisPool;

/// Waiting responders indexed by position, shared by every connection (and, with
/// Redis, every server process). `claim` is the only commit point of a pairing.
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Inserts or overwrites the entry with the same `entry_id`
    async fn add(&self, entry: &PoolEntry) -> Result<(), StoreError>;

    /// Unconditional removal; a no-op if absent
    async fn remove(&self, entry_id: &str) -> Result<(), StoreError>;

    async fn get_metadata(&self, entry_id: &str) -> Result<Option<PoolEntry>, StoreError>;

    /// Entries within `radius_km` of `origin`, nearest first, at most `max_count`
    async fn search(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        max_count: usize,
    ) -> Result<Vec<(String, f64)>, StoreError>;

    /// One batched fetch; the result is aligned with `entry_ids`
    async fn bulk_metadata(
        &self,
        entry_ids: &[String],
    ) -> Result<Vec<Option<PoolEntry>>, StoreError>;

    /// Atomically removes the entry if it is still present. Returns whether this
    /// caller removed it.
    async fn claim(&self, entry_id: &str) -> Result<bool, StoreError>;

    /// Records that the entry's connection is still open at `at`. Returns false
    /// when the entry is no longer in the pool; never recreates it.
    async fn touch(&self, entry_id: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Removes entries whose liveness was last refreshed before `cutoff`, and
    /// entries whose metadata is gone. How long an entry has waited plays no part.
    /// Returns the number of entries removed.
    async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Radius query plus one batched metadata fetch
#[derive(Clone)]
pub struct CandidateSource {
    pool: Arc<dyn PoolStore>,
}

impl CandidateSource {
    pub fn new(pool: Arc<dyn PoolStore>) -> Self {
        Self { pool }
    }

    /// Candidates around `origin`, nearest first. Entries that vanished between
    /// the radius query and the metadata fetch are dropped.
    pub async fn fetch(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        max_count: usize,
    ) -> Result<Vec<CandidateView>, StoreError> {
        let hits = self.pool.search(origin, radius_km, max_count).await?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let entry_ids: Vec<String> = hits.iter().map(|(id, _)| id.clone()).collect();
        let metadata = self.pool.bulk_metadata(&entry_ids).await?;

        let candidates = hits
            .into_iter()
            .zip(metadata)
            .filter_map(|((entry_id, distance_km), entry)| match entry {
                Some(entry) => Some(CandidateView { entry, distance_km }),
                None => {
                    tracing::debug!(%entry_id, "pool entry left before its metadata was read");
                    None
                }
            })
            .collect();

        Ok(candidates)
    }
}

/// Builds the pool backend selected by `POOL_BACKEND`
pub async fn connect_pool(config: &Config) -> anyhow::Result<Arc<dyn PoolStore>> {
    match config.pool_backend {
        PoolBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("REDIS_URL must be set"))?;
            let pool = RedisPool::connect(url).await?;
            tracing::info!("Responder pool backed by Redis");
            Ok(Arc::new(pool))
        }
        PoolBackend::Memory => {
            tracing::warn!("Responder pool is process-local; do not run more than one server");
            Ok(Arc::new(MemoryPool::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(entry_id: &str, lat: f64, lon: f64) -> PoolEntry {
        PoolEntry {
            entry_id: entry_id.to_string(),
            user_id: Uuid::new_v4(),
            location: GeoPoint::new(lat, lon),
            age: 25,
            gender_tag: None,
            joined_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_candidates_are_nearest_first_with_metadata() {
        let pool = Arc::new(MemoryPool::new());
        pool.add(&entry("far", 41.5, 29.0)).await.unwrap();
        pool.add(&entry("near", 41.01, 29.0)).await.unwrap();
        pool.add(&entry("mid", 41.2, 29.0)).await.unwrap();

        let source = CandidateSource::new(pool);
        let candidates = source.fetch(GeoPoint::new(41.0, 29.0), 300.0, 300).await.unwrap();

        let ids: Vec<&str> = candidates.iter().map(|c| c.entry.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!(candidates.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[tokio::test]
    async fn test_candidate_cap_and_radius() {
        let pool = Arc::new(MemoryPool::new());
        for i in 0..5 {
            pool.add(&entry(&format!("e{}", i), 41.0 + i as f64 * 0.01, 29.0)).await.unwrap();
        }
        // ~1100 km away
        pool.add(&entry("outside", 51.0, 29.0)).await.unwrap();

        let source = CandidateSource::new(pool);
        let capped = source.fetch(GeoPoint::new(41.0, 29.0), 300.0, 3).await.unwrap();
        assert_eq!(capped.len(), 3);

        let all = source.fetch(GeoPoint::new(41.0, 29.0), 300.0, 300).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|c| c.entry.entry_id != "outside"));
    }

    #[tokio::test]
    async fn test_removed_entry_leaves_no_trace() {
        let pool = Arc::new(MemoryPool::new());
        let e = entry("gone", 41.0, 29.0);
        pool.add(&e).await.unwrap();
        pool.remove(&e.entry_id).await.unwrap();

        let source = CandidateSource::new(pool.clone());
        let candidates = source.fetch(GeoPoint::new(41.0, 29.0), 300.0, 300).await.unwrap();
        assert!(candidates.is_empty());
        assert!(pool.get_metadata("gone").await.unwrap().is_none());
    }
}
