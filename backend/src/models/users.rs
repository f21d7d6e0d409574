use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::GeoPoint;

/// What the matcher needs to know about a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub user_id: Uuid,
    pub location: GeoPoint,
    pub age: u32,
    pub gender_tag: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserProfileRow {
    pub id: Uuid,
    pub location_lat: Option<f64>,
    pub location_lon: Option<f64>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
}

impl UserProfileRow {
    /// `None` unless both coordinates and the birth date are set
    pub fn into_location(self, today: NaiveDate) -> Option<UserLocation> {
        let (lat, lon, birth_date) = (self.location_lat?, self.location_lon?, self.birth_date?);
        Some(UserLocation {
            user_id: self.id,
            location: GeoPoint::new(lat, lon),
            age: age_on(birth_date, today),
            gender_tag: self.gender,
        })
    }
}

/// Whole years between `birth_date` and `today`
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        assert_eq!(age_on(date(1995, 6, 15), date(2025, 6, 14)), 29);
        assert_eq!(age_on(date(1995, 6, 15), date(2025, 6, 15)), 30);
        assert_eq!(age_on(date(1995, 6, 15), date(2025, 12, 1)), 30);
    }

    #[test]
    fn test_future_birth_date_is_zero() {
        assert_eq!(age_on(date(2030, 1, 1), date(2025, 1, 1)), 0);
    }

    #[test]
    fn test_incomplete_profile_has_no_location() {
        let row = UserProfileRow {
            id: Uuid::new_v4(),
            location_lat: Some(41.0),
            location_lon: None,
            birth_date: Some(date(1990, 1, 1)),
            gender: None,
        };
        assert!(row.into_location(date(2025, 1, 1)).is_none());

        let row = UserProfileRow {
            id: Uuid::new_v4(),
            location_lat: Some(41.0),
            location_lon: Some(29.0),
            birth_date: Some(date(1990, 1, 1)),
            gender: Some("f".to_string()),
        };
        let location = row.into_location(date(2025, 1, 1)).unwrap();
        assert_eq!(location.age, 35);
        assert_eq!(location.location, GeoPoint::new(41.0, 29.0));
        assert_eq!(location.gender_tag.as_deref(), Some("f"));
    }
}
