use std::sync::Arc;

use blink::{
    AppState, Config, create_router,
    db::{PgMatchStore, PgProfileProvider},
    get_db_pool,
    matching::{MatchSettings, RoleAssigner},
    pool::connect_pool,
    utils,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = blink::db::DatabaseConfig::from_env()?;
    let db = get_db_pool(&db_config).await?;

    // Run migrations
    blink::db::migrations::run_migrations(&db).await?;

    let pool = connect_pool(&config).await?;
    let state = AppState::new(
        pool,
        Arc::new(PgMatchStore::new(db.clone())),
        Arc::new(PgProfileProvider::new(db)),
        RoleAssigner::from_os_rng(config.responder_probability),
        MatchSettings::from(&config),
    );

    let app = create_router(state, &config.allowed_origins);

    let port = config.port;
    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!(
        "Server running on port {} (responder probability {}, radius {} km)",
        port,
        config.responder_probability,
        config.search_radius_km
    );

    axum::serve(listener, app).await?;

    Ok(())
}
