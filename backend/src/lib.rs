pub mod constants;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod matching;
pub mod models;
pub mod pool;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use utils::config::Config;
pub use db::connection::get_db_pool;
pub use routes::create_router;
pub use state::AppState;

// Re-export common types
pub use sqlx::PgPool;
pub use anyhow::Result;
pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};
