use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{UserLocation, UserProfileRow};
use crate::services::ProfileProvider;

pub async fn get_user_profile(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, UserProfileRow>(
        r#"
        SELECT id, location_lat, location_lon, birth_date, gender
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Reads location and age from the profile table owned by the account service
#[derive(Debug, Clone)]
pub struct PgProfileProvider {
    pool: PgPool,
}

impl PgProfileProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileProvider for PgProfileProvider {
    async fn get_user_location_and_age(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserLocation>, StoreError> {
        let row = get_user_profile(&self.pool, user_id).await?;
        let today = Utc::now().date_naive();
        Ok(row.and_then(|r| r.into_location(today)))
    }
}
