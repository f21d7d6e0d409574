use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_GEO_LATITUDE;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite and inside the range the geo index can store
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-MAX_GEO_LATITUDE..=MAX_GEO_LATITUDE).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A waiting responder. `entry_id` is the handle of the connection that joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEntry {
    pub entry_id: String,
    pub user_id: Uuid,
    pub location: GeoPoint,
    pub age: u32,
    pub gender_tag: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl PoolEntry {
    /// Minutes since the entry joined, clamped at zero for clock skew
    pub fn wait_minutes(&self, now: DateTime<Utc>) -> f64 {
        let waited = (now - self.joined_at).num_milliseconds() as f64 / 60_000.0;
        waited.max(0.0)
    }
}

/// A pool entry as seen from one requester's position
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateView {
    pub entry: PoolEntry,
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_polar_latitudes_are_rejected() {
        assert!(GeoPoint::new(41.0082, 28.9784).is_valid());
        assert!(GeoPoint::new(85.05, 0.0).is_valid());
        assert!(GeoPoint::new(-85.05, 180.0).is_valid());
        assert!(!GeoPoint::new(86.0, 0.0).is_valid());
        assert!(!GeoPoint::new(-90.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_wait_is_clamped_at_zero() {
        let now = Utc::now();
        let entry = PoolEntry {
            entry_id: "conn-1".to_string(),
            user_id: Uuid::new_v4(),
            location: GeoPoint::new(0.0, 0.0),
            age: 30,
            gender_tag: None,
            joined_at: now + Duration::minutes(2),
        };
        assert_eq!(entry.wait_minutes(now), 0.0);
        assert_eq!(entry.wait_minutes(now + Duration::minutes(5)), 3.0);
    }
}
