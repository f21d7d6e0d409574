use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::PoolStore;
use crate::errors::StoreError;
use crate::models::{GeoPoint, PoolEntry};
use crate::utils::geo::haversine_km;

#[derive(Debug, Clone)]
struct Slot {
    entry: PoolEntry,
    last_seen: DateTime<Utc>,
}

/// Process-local pool. Every operation holds the lock for its whole duration,
/// which makes `claim` atomic with respect to every other caller.
#[derive(Debug, Default)]
pub struct MemoryPool {
    entries: RwLock<HashMap<String, Slot>>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl PoolStore for MemoryPool {
    async fn add(&self, entry: &PoolEntry) -> Result<(), StoreError> {
        let slot = Slot {
            entry: entry.clone(),
            last_seen: Utc::now(),
        };
        self.entries
            .write()
            .await
            .insert(entry.entry_id.clone(), slot);
        Ok(())
    }

    async fn remove(&self, entry_id: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(entry_id);
        Ok(())
    }

    async fn get_metadata(&self, entry_id: &str) -> Result<Option<PoolEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .get(entry_id)
            .map(|slot| slot.entry.clone()))
    }

    async fn search(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        max_count: usize,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        let entries = self.entries.read().await;
        let mut hits: Vec<(String, f64)> = entries
            .values()
            .map(|slot| {
                let e = &slot.entry;
                (e.entry_id.clone(), haversine_km(origin, e.location))
            })
            .filter(|(_, d)| *d <= radius_km)
            .collect();

        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.truncate(max_count);
        Ok(hits)
    }

    async fn bulk_metadata(
        &self,
        entry_ids: &[String],
    ) -> Result<Vec<Option<PoolEntry>>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entry_ids
            .iter()
            .map(|id| entries.get(id).map(|slot| slot.entry.clone()))
            .collect())
    }

    async fn claim(&self, entry_id: &str) -> Result<bool, StoreError> {
        Ok(self.entries.write().await.remove(entry_id).is_some())
    }

    async fn touch(&self, entry_id: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        match self.entries.write().await.get_mut(entry_id) {
            Some(slot) => {
                slot.last_seen = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, slot| slot.last_seen >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}
