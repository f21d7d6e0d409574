use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use blink::{
    constants::DEFAULT_JANITOR_INTERVAL_SECS,
    pool::{PoolStore, connect_pool},
    utils::{config::Config, init_logging},
};
use chrono::Utc;
use clap::Parser;
use tokio::time;
use tracing::{error, info};

/// Sweeps pool entries whose connection stopped reporting in, i.e. ones left
/// behind by crashed server processes
#[derive(Debug, Parser)]
#[command(name = "pool_janitor")]
struct Args {
    /// Seconds between sweeps
    #[arg(long, default_value_t = DEFAULT_JANITOR_INTERVAL_SECS)]
    interval_secs: u64,

    /// Override POOL_ENTRY_STALE_SECS
    #[arg(long)]
    stale_secs: Option<i64>,

    /// Sweep once and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = Config::from_env()?;
    let stale_secs = args.stale_secs.unwrap_or(config.pool_entry_stale_secs);
    let pool = connect_pool(&config).await?;

    info!("🧹 Starting pool janitor (entries silent for {}s are swept)", stale_secs);

    if args.once {
        let removed = sweep(pool.as_ref(), stale_secs).await?;
        info!("🧹 Removed {} stale pool entries", removed);
        return Ok(());
    }

    run_janitor(pool, stale_secs, Duration::from_secs(args.interval_secs)).await
}

async fn run_janitor(pool: Arc<dyn PoolStore>, stale_secs: i64, interval: Duration) -> Result<()> {
    let mut ticker = time::interval(interval);
    let mut iter_count: usize = 0;

    loop {
        ticker.tick().await;
        iter_count += 1;

        match sweep(pool.as_ref(), stale_secs).await {
            Ok(removed) if removed > 0 => {
                info!("🧹 Removed {} stale pool entries", removed);
            }
            Ok(_) => {
                if iter_count % 20 == 0 {
                    info!("📊 Pool janitor iteration {}: nothing to sweep", iter_count);
                }
            }
            Err(e) => {
                error!("❌ Pool sweep failed: {}", e);
            }
        }
    }
}

async fn sweep(pool: &dyn PoolStore, stale_secs: i64) -> Result<u64> {
    let cutoff = Utc::now() - chrono::Duration::seconds(stale_secs);
    Ok(pool.sweep(cutoff).await?)
}
