use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Accepted,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Accepted => "accepted",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(MatchStatus::Accepted),
            other => Err(format!("unknown match status '{}'", other)),
        }
    }
}

impl TryFrom<String> for MatchStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub responder_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// The other participant, or `None` if `user_id` is not part of this match
    pub fn partner_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.requester_id == user_id {
            Some(self.responder_id)
        } else if self.responder_id == user_id {
            Some(self.requester_id)
        } else {
            None
        }
    }
}

/// One row of a user's match list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_of() {
        let requester = Uuid::new_v4();
        let responder = Uuid::new_v4();
        let now = Utc::now();
        let m = Match {
            id: Uuid::new_v4(),
            requester_id: requester,
            responder_id: responder,
            status: MatchStatus::Accepted,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(m.partner_of(requester), Some(responder));
        assert_eq!(m.partner_of(responder), Some(requester));
        assert_eq!(m.partner_of(Uuid::new_v4()), None);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("accepted".parse::<MatchStatus>(), Ok(MatchStatus::Accepted));
        assert!("pending".parse::<MatchStatus>().is_err());
        assert_eq!(MatchStatus::Accepted.to_string(), "accepted");
    }
}
