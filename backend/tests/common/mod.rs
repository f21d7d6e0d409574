#![allow(dead_code)]

use std::sync::Arc;

use blink::{
    AppState,
    matching::{MatchSettings, Matchmaker, Role, RoleAssigner},
    models::{GeoPoint, PoolEntry, UserLocation},
    pool::{MemoryPool, PoolStore},
    services::{MemoryMatchStore, MemoryProfiles},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Istanbul, where every test scenario happens
pub const ORIGIN: GeoPoint = GeoPoint {
    latitude: 41.0082,
    longitude: 28.9784,
};

const KM_PER_DEGREE_LAT: f64 = 111.195;

/// A point `km` due north of the origin
pub fn north_of_origin(km: f64) -> GeoPoint {
    GeoPoint::new(ORIGIN.latitude + km / KM_PER_DEGREE_LAT, ORIGIN.longitude)
}

/// In-memory stores wired the way the server wires the real ones
pub struct TestWorld {
    pub pool: Arc<MemoryPool>,
    pub matches: Arc<MemoryMatchStore>,
    pub profiles: Arc<MemoryProfiles>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            pool: Arc::new(MemoryPool::new()),
            matches: Arc::new(MemoryMatchStore::new()),
            profiles: Arc::new(MemoryProfiles::new()),
        }
    }

    pub fn matchmaker(&self) -> Matchmaker {
        Matchmaker::new(
            self.pool.clone(),
            self.matches.clone(),
            self.profiles.clone(),
            MatchSettings::default(),
        )
    }

    pub fn app_state(&self, role: Role) -> AppState {
        AppState::new(
            self.pool.clone(),
            self.matches.clone(),
            self.profiles.clone(),
            RoleAssigner::fixed(role),
            MatchSettings::default(),
        )
    }

    /// Registers a user with a profile and returns their id
    pub async fn user(&self, location: GeoPoint, age: u32) -> Uuid {
        let user_id = Uuid::new_v4();
        self.profiles
            .upsert(UserLocation {
                user_id,
                location,
                age,
                gender_tag: None,
            })
            .await;
        user_id
    }

    /// Puts a user into the pool as if they had joined `waited_minutes` ago
    pub async fn waiting_responder(
        &self,
        location: GeoPoint,
        age: u32,
        waited_minutes: i64,
    ) -> PoolEntry {
        let user_id = self.user(location, age).await;
        let entry = PoolEntry {
            entry_id: format!("conn-{}", Uuid::new_v4()),
            user_id,
            location,
            age,
            gender_tag: None,
            joined_at: Utc::now() - Duration::minutes(waited_minutes),
        };
        self.pool.add(&entry).await.unwrap();
        entry
    }
}
