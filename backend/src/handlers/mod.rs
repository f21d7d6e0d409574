pub mod matches;
pub mod session;

pub use matches::list_matches;
pub use session::ws_handler;

pub async fn health_check() -> &'static str {
    "OK"
}
