use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{
    AsyncCommands, Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use uuid::Uuid;

use super::PoolStore;
use crate::constants::*;
use crate::errors::StoreError;
use crate::models::{GeoPoint, PoolEntry};

const CLAIM_SCRIPT: &str = r#"
if redis.call('ZREM', KEYS[1], ARGV[1]) == 1 then
    redis.call('DEL', KEYS[2])
    return 1
end
return 0
"#;

// Only refreshes an entry that is still indexed, so a late heartbeat cannot
// resurrect the hash of a claimed entry
const TOUCH_SCRIPT: &str = r#"
if redis.call('ZSCORE', KEYS[1], ARGV[1]) then
    redis.call('HSET', KEYS[2], 'last_seen', ARGV[2])
    return 1
end
return 0
"#;

const LAST_SEEN_FIELD: &str = "last_seen";

/// Pool shared by every server process.
///
/// `blink:pool:geo` is a sorted set used as the GEO index (member = entry id).
/// `blink:pool:meta:{entry_id}` is a hash with the entry's metadata and its
/// `last_seen` liveness timestamp. `add` and `remove` write both keys in one
/// MULTI/EXEC. `claim` is a Lua script, so of any number of concurrent claims
/// for one entry exactly one sees `1`.
#[derive(Clone)]
pub struct RedisPool {
    conn: ConnectionManager,
    claim_script: Script,
    touch_script: Script,
}

impl RedisPool {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(REDIS_CONNECTION_RETRIES)
            .set_connection_timeout(Duration::from_millis(REDIS_CONNECTION_TIMEOUT_MS));

        let client = Client::open(redis_url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            claim_script: Script::new(CLAIM_SCRIPT),
            touch_script: Script::new(TOUCH_SCRIPT),
        }
    }

    async fn fetch_raw_metadata(
        &self,
        entry_ids: &[String],
    ) -> Result<Vec<HashMap<String, String>>, StoreError> {
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for entry_id in entry_ids {
            pipe.hgetall(pool_meta_key(entry_id));
        }

        let mut conn = self.conn.clone();
        let maps: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;
        Ok(maps)
    }
}

#[async_trait]
impl PoolStore for RedisPool {
    async fn add(&self, entry: &PoolEntry) -> Result<(), StoreError> {
        let meta_key = pool_meta_key(&entry.entry_id);
        let mut fields = encode_metadata(entry);
        fields.push((LAST_SEEN_FIELD, Utc::now().timestamp_millis().to_string()));

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("GEOADD")
            .arg(POOL_GEO_KEY)
            .arg(entry.location.longitude)
            .arg(entry.location.latitude)
            .arg(&entry.entry_id)
            .ignore()
            .hset_multiple(&meta_key, fields.as_slice())
            .ignore();

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn remove(&self, entry_id: &str) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic()
            .zrem(POOL_GEO_KEY, entry_id)
            .ignore()
            .del(pool_meta_key(entry_id))
            .ignore();

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn get_metadata(&self, entry_id: &str) -> Result<Option<PoolEntry>, StoreError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(pool_meta_key(entry_id)).await?;
        decode_metadata(entry_id, &fields)
    }

    async fn search(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        max_count: usize,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        let mut conn = self.conn.clone();
        let hits: Vec<(String, f64)> = redis::cmd("GEOSEARCH")
            .arg(POOL_GEO_KEY)
            .arg("FROMLONLAT")
            .arg(origin.longitude)
            .arg(origin.latitude)
            .arg("BYRADIUS")
            .arg(radius_km)
            .arg("km")
            .arg("ASC")
            .arg("COUNT")
            .arg(max_count)
            .arg("WITHDIST")
            .query_async(&mut conn)
            .await?;

        Ok(hits)
    }

    async fn bulk_metadata(
        &self,
        entry_ids: &[String],
    ) -> Result<Vec<Option<PoolEntry>>, StoreError> {
        let maps = self.fetch_raw_metadata(entry_ids).await?;

        let entries = entry_ids
            .iter()
            .zip(maps.iter())
            .map(|(entry_id, fields)| match decode_metadata(entry_id, fields) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable pool entry: {}", e);
                    None
                }
            })
            .collect();

        Ok(entries)
    }

    async fn claim(&self, entry_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = self
            .claim_script
            .key(POOL_GEO_KEY)
            .key(pool_meta_key(entry_id))
            .arg(entry_id)
            .invoke_async(&mut conn)
            .await?;

        Ok(removed == 1)
    }

    async fn touch(&self, entry_id: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let touched: i64 = self
            .touch_script
            .key(POOL_GEO_KEY)
            .key(pool_meta_key(entry_id))
            .arg(entry_id)
            .arg(at.timestamp_millis())
            .invoke_async(&mut conn)
            .await?;

        Ok(touched == 1)
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.zrange(POOL_GEO_KEY, 0, -1).await?;
        let maps = self.fetch_raw_metadata(&members).await?;

        let mut removed = 0;
        for (entry_id, fields) in members.iter().zip(maps.iter()) {
            let stale = match last_seen(fields) {
                Some(seen) => seen < cutoff,
                // Geo member without a readable hash: its process died between writes
                None => {
                    tracing::warn!(%entry_id, "sweeping pool entry without liveness");
                    true
                }
            };

            if stale && self.claim(entry_id).await? {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

fn encode_metadata(entry: &PoolEntry) -> Vec<(&'static str, String)> {
    vec![
        ("user_id", entry.user_id.to_string()),
        ("latitude", entry.location.latitude.to_string()),
        ("longitude", entry.location.longitude.to_string()),
        ("age", entry.age.to_string()),
        ("gender", entry.gender_tag.clone().unwrap_or_default()),
        ("joined_at", entry.joined_at.timestamp_millis().to_string()),
    ]
}

/// An empty hash means the entry is absent
fn decode_metadata(
    entry_id: &str,
    fields: &HashMap<String, String>,
) -> Result<Option<PoolEntry>, StoreError> {
    if fields.is_empty() {
        return Ok(None);
    }

    let corrupt = |reason: String| StoreError::CorruptMetadata {
        entry_id: entry_id.to_string(),
        reason,
    };

    let user_id: Uuid = parse_field(fields, "user_id").map_err(corrupt)?;
    let latitude: f64 = parse_field(fields, "latitude").map_err(corrupt)?;
    let longitude: f64 = parse_field(fields, "longitude").map_err(corrupt)?;
    let age: u32 = parse_field(fields, "age").map_err(corrupt)?;
    let joined_at_ms: i64 = parse_field(fields, "joined_at").map_err(corrupt)?;
    let joined_at = DateTime::from_timestamp_millis(joined_at_ms)
        .ok_or_else(|| corrupt(format!("joined_at {} out of range", joined_at_ms)))?;

    let gender_tag = fields
        .get("gender")
        .filter(|g| !g.is_empty())
        .cloned();

    Ok(Some(PoolEntry {
        entry_id: entry_id.to_string(),
        user_id,
        location: GeoPoint::new(latitude, longitude),
        age,
        gender_tag,
        joined_at,
    }))
}

/// When the entry's connection last reported in; `None` if the hash is gone or
/// the field is unreadable
fn last_seen(fields: &HashMap<String, String>) -> Option<DateTime<Utc>> {
    parse_field::<i64>(fields, LAST_SEEN_FIELD)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

fn parse_field<T: FromStr>(fields: &HashMap<String, String>, name: &str) -> Result<T, String> {
    let raw = fields
        .get(name)
        .ok_or_else(|| format!("missing field '{}'", name))?;
    raw.parse()
        .map_err(|_| format!("invalid value '{}' for field '{}'", raw, name))
}
