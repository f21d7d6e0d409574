pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{Match, MatchStatus, UserLocation};

pub use memory::{MemoryMatchStore, MemoryProfiles};

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn create_match(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        status: MatchStatus,
    ) -> Result<Match, StoreError>;

    /// Matches involving `user_id` (on either side) created at or after `since`
    async fn find_matches_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Match>, StoreError>;

    /// Accepted matches involving `user_id`, most recently updated first
    async fn list_accepted_for_user(&self, user_id: Uuid) -> Result<Vec<Match>, StoreError>;
}

#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// `None` when the user is unknown or has not set a location and birth date
    async fn get_user_location_and_age(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserLocation>, StoreError>;
}
