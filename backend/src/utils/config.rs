use anyhow::Result;
use std::env;
use std::str::FromStr;
use crate::constants::*;

/// Where the responder pool lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolBackend {
    /// Shared across server processes
    Redis,
    /// Process-local, single instance only
    Memory,
}

impl FromStr for PoolBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(PoolBackend::Redis),
            "memory" => Ok(PoolBackend::Memory),
            other => Err(anyhow::anyhow!(
                "POOL_BACKEND must be 'redis' or 'memory', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: Option<String>,
    pub port: u16,
    pub pool_backend: PoolBackend,
    pub responder_probability: f64,
    pub search_radius_km: f64,
    pub max_candidates: usize,
    /// Seconds without a liveness refresh before the janitor sweeps an entry
    pub pool_entry_stale_secs: i64,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let pool_backend: PoolBackend = env::var("POOL_BACKEND")
            .unwrap_or_else(|_| "redis".to_string())
            .parse()?;

        let redis_url = env::var("REDIS_URL").ok();
        if pool_backend == PoolBackend::Redis && redis_url.is_none() {
            return Err(anyhow::anyhow!("REDIS_URL must be set when POOL_BACKEND=redis"));
        }

        let responder_probability = env::var("RESPONDER_PROBABILITY")
            .unwrap_or_else(|_| DEFAULT_RESPONDER_PROBABILITY.to_string())
            .parse()
            .unwrap_or(DEFAULT_RESPONDER_PROBABILITY);
        validate_probability(responder_probability)?;

        let search_radius_km = env::var("SEARCH_RADIUS_KM")
            .unwrap_or_else(|_| DEFAULT_SEARCH_RADIUS_KM.to_string())
            .parse()
            .unwrap_or(DEFAULT_SEARCH_RADIUS_KM);
        let max_candidates = env::var("MAX_CANDIDATES")
            .unwrap_or_else(|_| DEFAULT_MAX_CANDIDATES.to_string())
            .parse()
            .unwrap_or(DEFAULT_MAX_CANDIDATES);
        validate_search_limits(search_radius_km, max_candidates)?;

        let pool_entry_stale_secs = env::var("POOL_ENTRY_STALE_SECS")
            .unwrap_or_else(|_| DEFAULT_POOL_ENTRY_STALE_SECS.to_string())
            .parse()
            .unwrap_or(DEFAULT_POOL_ENTRY_STALE_SECS);
        validate_stale_secs(pool_entry_stale_secs)?;

        Ok(Self {
            redis_url,
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_SERVER_PORT),
            pool_backend,
            responder_probability,
            search_radius_km,
            max_candidates,
            pool_entry_stale_secs,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

fn validate_probability(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(anyhow::anyhow!(
            "RESPONDER_PROBABILITY must be between 0 and 1, got {}",
            p
        ));
    }
    Ok(())
}

fn validate_search_limits(radius_km: f64, max_candidates: usize) -> Result<()> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(anyhow::anyhow!(
            "SEARCH_RADIUS_KM must be a positive number, got {}",
            radius_km
        ));
    }
    if max_candidates == 0 {
        return Err(anyhow::anyhow!("MAX_CANDIDATES must be at least 1"));
    }
    Ok(())
}

fn validate_stale_secs(secs: i64) -> Result<()> {
    // An entry must survive at least one missed heartbeat
    if secs <= POOL_HEARTBEAT_INTERVAL_SECS as i64 {
        return Err(anyhow::anyhow!(
            "POOL_ENTRY_STALE_SECS must exceed the {}s heartbeat interval, got {}",
            POOL_HEARTBEAT_INTERVAL_SECS,
            secs
        ));
    }
    Ok(())
}
