// =============================================================================
// Blink Matchmaking Constants
// =============================================================================
// Product policy and tuning knobs for the matchmaking pool live here so they
// can be adjusted from a single location.

// =============================================================================
// CANDIDATE SEARCH
// =============================================================================

/// Radius of the geo query around a requester
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 300.0;

/// Maximum number of candidates returned by one radius query
pub const DEFAULT_MAX_CANDIDATES: usize = 300;

/// Mean Earth radius used for haversine distances
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Highest latitude the Redis GEO index accepts (Web Mercator limit)
pub const MAX_GEO_LATITUDE: f64 = 85.05112878;

// =============================================================================
// HISTORY POLICY
// =============================================================================

/// How far back prior matches are considered
pub const HISTORY_LOOKBACK_DAYS: i64 = 30;

/// A prior match younger than this makes the partner unselectable
pub const HARD_EXCLUSION_HOURS: i64 = 24;

/// Prior matches younger than this (but past the hard exclusion) get the heavy penalty
pub const RECENT_MATCH_HOURS: i64 = 168;

/// Penalty for a partner matched between 24 hours and 1 week ago
pub const RECENT_MATCH_PENALTY: u32 = 50;

/// Penalty for a partner matched more than 1 week ago (inside the lookback)
pub const OLD_MATCH_PENALTY: u32 = 10;

// =============================================================================
// SCORING
// =============================================================================

/// Distance score starts here and loses one point per km
pub const MAX_DISTANCE_SCORE: f64 = 100.0;

/// Age score starts here and loses AGE_SCORE_PER_YEAR per year of difference
pub const MAX_AGE_SCORE: f64 = 50.0;
pub const AGE_SCORE_PER_YEAR: f64 = 5.0;

/// Wait score gains WAIT_SCORE_PER_MINUTE per minute waited, capped at MAX_WAIT_SCORE
pub const MAX_WAIT_SCORE: f64 = 50.0;
pub const WAIT_SCORE_PER_MINUTE: f64 = 5.0;

// =============================================================================
// SESSION PROTOCOL
// =============================================================================

/// Probability that a join request is assigned the responder role
pub const DEFAULT_RESPONDER_PROBABILITY: f64 = 0.7;

pub const WAITING_IN_POOL_MESSAGE: &str = "You are in the pool. Waiting for someone to find you.";
pub const NO_MATCH_FOUND_MESSAGE: &str = "No one is available right now. Try again in a moment.";
pub const MISSING_PROFILE_MESSAGE: &str = "Set your location and birth date before matching.";
pub const INVALID_LOCATION_MESSAGE: &str = "Your location is not valid.";
pub const STORE_UNAVAILABLE_MESSAGE: &str =
    "Matchmaking is temporarily unavailable. Please try again.";

// =============================================================================
// REDIS POOL LAYOUT
// =============================================================================

/// Sorted set holding the geo index of waiting responders
pub const POOL_GEO_KEY: &str = "blink:pool:geo";

/// Prefix of the per-entry metadata hash
pub const POOL_META_KEY_PREFIX: &str = "blink:pool:meta:";

/// Redis connection timeout
pub const REDIS_CONNECTION_TIMEOUT_MS: u64 = 500;

/// Reconnect attempts made by the Redis connection manager
pub const REDIS_CONNECTION_RETRIES: usize = 3;

// =============================================================================
// TRANSIENT RETRY
// =============================================================================

/// Attempts made for a read-only store operation before giving up
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles on each attempt
pub const RETRY_BASE_DELAY_MS: u64 = 50;

// =============================================================================
// POOL JANITOR
// =============================================================================

/// How often an open session refreshes its pool entry's liveness
pub const POOL_HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Entries whose liveness was last refreshed longer ago than this are swept
pub const DEFAULT_POOL_ENTRY_STALE_SECS: i64 = 120;

/// How often the janitor sweeps the pool
pub const DEFAULT_JANITOR_INTERVAL_SECS: u64 = 30;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Returns the Redis key of an entry's metadata hash
pub fn pool_meta_key(entry_id: &str) -> String {
    format!("{}{}", POOL_META_KEY_PREFIX, entry_id)
}
