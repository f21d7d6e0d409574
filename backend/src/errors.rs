use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::STORE_UNAVAILABLE_MESSAGE;

/// Failures of the pool, match and profile backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt pool metadata for entry {entry_id}: {reason}")]
    CorruptMetadata { entry_id: String, reason: String },
}

impl StoreError {
    /// Whether retrying the same operation may succeed. Connection trouble is;
    /// a command the server rejected is not.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Redis(e) => e.is_io_error() || e.is_cluster_error(),
            StoreError::Database(e) => {
                matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
            }
            StoreError::CorruptMetadata { .. } => false,
        }
    }
}

/// Why a search ended without a pairing decision
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("{0}")]
    Validation(String),

    #[error("store unavailable during {operation}: {source}")]
    TransientStore {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(
        "match persistence failed after claiming entry {entry_id} of user {responder_id}: {source}"
    )]
    PersistenceAfterClaim {
        entry_id: String,
        responder_id: Uuid,
        #[source]
        source: StoreError,
    },
}

impl MatchError {
    /// Text sent to the client in an `error` event
    pub fn client_message(&self) -> String {
        match self {
            MatchError::Validation(reason) => reason.clone(),
            MatchError::TransientStore { .. } => STORE_UNAVAILABLE_MESSAGE.to_string(),
            MatchError::PersistenceAfterClaim { .. } => {
                "Could not save the match. Please try again.".to_string()
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Internal error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let redis_err = StoreError::from(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection reset",
        )));
        assert!(redis_err.is_transient());

        let corrupt = StoreError::CorruptMetadata {
            entry_id: "abc".to_string(),
            reason: "missing age".to_string(),
        };
        assert!(!corrupt.is_transient());
    }

    #[test]
    fn test_rejected_commands_are_not_retried() {
        let rejected = StoreError::from(redis::RedisError::from((
            redis::ErrorKind::ResponseError,
            "ERR COUNT must be > 0",
        )));
        assert!(!rejected.is_transient());

        assert!(StoreError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_transient());
    }

    #[test]
    fn test_validation_message_reaches_client() {
        let err = MatchError::Validation("Your profile has no location".to_string());
        assert_eq!(err.client_message(), "Your profile has no location");
    }
}
