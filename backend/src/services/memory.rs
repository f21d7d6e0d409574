use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MatchStore, ProfileProvider};
use crate::errors::StoreError;
use crate::models::{Match, MatchStatus, UserLocation};

/// Match history kept in process memory
#[derive(Debug, Default)]
pub struct MemoryMatchStore {
    matches: RwLock<Vec<Match>>,
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an existing match as-is, e.g. one created in the past
    pub async fn insert(&self, m: Match) {
        self.matches.write().await.push(m);
    }

    pub async fn all(&self) -> Vec<Match> {
        self.matches.read().await.clone()
    }
}

#[async_trait]
impl MatchStore for MemoryMatchStore {
    async fn create_match(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        status: MatchStatus,
    ) -> Result<Match, StoreError> {
        let now = Utc::now();
        let m = Match {
            id: Uuid::new_v4(),
            requester_id,
            responder_id,
            status,
            created_at: now,
            updated_at: now,
        };
        self.matches.write().await.push(m.clone());
        Ok(m)
    }

    async fn find_matches_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Match>, StoreError> {
        let matches = self.matches.read().await;
        Ok(matches
            .iter()
            .filter(|m| m.partner_of(user_id).is_some() && m.created_at >= since)
            .cloned()
            .collect())
    }

    async fn list_accepted_for_user(&self, user_id: Uuid) -> Result<Vec<Match>, StoreError> {
        let matches = self.matches.read().await;
        let mut accepted: Vec<Match> = matches
            .iter()
            .filter(|m| m.partner_of(user_id).is_some() && m.status == MatchStatus::Accepted)
            .cloned()
            .collect();
        accepted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(accepted)
    }
}

/// Profiles kept in process memory
#[derive(Debug, Default)]
pub struct MemoryProfiles {
    profiles: RwLock<HashMap<Uuid, UserLocation>>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, profile: UserLocation) {
        self.profiles.write().await.insert(profile.user_id, profile);
    }
}

#[async_trait]
impl ProfileProvider for MemoryProfiles {
    async fn get_user_location_and_age(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserLocation>, StoreError> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }
}
