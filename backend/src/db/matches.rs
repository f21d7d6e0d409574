use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{Match, MatchStatus};
use crate::services::MatchStore;

const MATCH_COLUMNS: &str =
    "id, user_a_id AS requester_id, user_b_id AS responder_id, status, created_at, updated_at";

pub async fn create_match(
    pool: &PgPool,
    requester_id: Uuid,
    responder_id: Uuid,
    status: MatchStatus,
) -> Result<Match, sqlx::Error> {
    sqlx::query_as::<_, Match>(&format!(
        r#"
        INSERT INTO matches (id, user_a_id, user_b_id, status)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        MATCH_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(requester_id)
    .bind(responder_id)
    .bind(status.as_str())
    .fetch_one(pool)
    .await
}

/// Matches with `user_id` on either side, created at or after `since`
pub async fn find_matches_since(
    pool: &PgPool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<Match>, sqlx::Error> {
    sqlx::query_as::<_, Match>(&format!(
        r#"
        SELECT {}
        FROM matches
        WHERE (user_a_id = $1 OR user_b_id = $1)
        AND created_at >= $2
        ORDER BY created_at DESC
        "#,
        MATCH_COLUMNS
    ))
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await
}

pub async fn list_accepted_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Match>, sqlx::Error> {
    sqlx::query_as::<_, Match>(&format!(
        r#"
        SELECT {}
        FROM matches
        WHERE (user_a_id = $1 OR user_b_id = $1)
        AND status = $2
        ORDER BY updated_at DESC
        "#,
        MATCH_COLUMNS
    ))
    .bind(user_id)
    .bind(MatchStatus::Accepted.as_str())
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn create_match(
        &self,
        requester_id: Uuid,
        responder_id: Uuid,
        status: MatchStatus,
    ) -> Result<Match, StoreError> {
        Ok(create_match(&self.pool, requester_id, responder_id, status).await?)
    }

    async fn find_matches_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Match>, StoreError> {
        Ok(find_matches_since(&self.pool, user_id, since).await?)
    }

    async fn list_accepted_for_user(&self, user_id: Uuid) -> Result<Vec<Match>, StoreError> {
        Ok(list_accepted_for_user(&self.pool, user_id).await?)
    }
}
