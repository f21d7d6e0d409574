pub mod config;
pub mod geo;
pub mod logging;
pub mod retry;

pub use config::{Config, PoolBackend};
pub use logging::init_logging;
pub use retry::retry_transient;
