use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::constants::*;
use crate::errors::StoreError;
use crate::models::Match;
use crate::services::MatchStore;

/// partner user id -> most recent match with that partner
pub type ExclusionMap = HashMap<Uuid, DateTime<Utc>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryVerdict {
    /// Never selectable, whatever the score
    Excluded,
    /// Points deducted from the total
    Penalty(u32),
}

/// Policy for a candidate whose last match with the requester was at `last_match_at`
pub fn verdict(last_match_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> HistoryVerdict {
    let Some(last) = last_match_at else {
        return HistoryVerdict::Penalty(0);
    };

    let hours_since = (now - last).num_milliseconds() as f64 / 3_600_000.0;
    if hours_since < HARD_EXCLUSION_HOURS as f64 {
        HistoryVerdict::Excluded
    } else if hours_since < RECENT_MATCH_HOURS as f64 {
        HistoryVerdict::Penalty(RECENT_MATCH_PENALTY)
    } else {
        HistoryVerdict::Penalty(OLD_MATCH_PENALTY)
    }
}

/// Collapses a requester's matches to the latest timestamp per partner
pub fn reduce_history(requester_id: Uuid, matches: &[Match]) -> ExclusionMap {
    let mut latest = ExclusionMap::new();
    for m in matches {
        let Some(partner) = m.partner_of(requester_id) else {
            continue;
        };
        latest
            .entry(partner)
            .and_modify(|at| *at = (*at).max(m.created_at))
            .or_insert(m.created_at);
    }
    latest
}

/// Summarizes recent pairing history; rebuilt on every search
#[derive(Clone)]
pub struct HistoryGuard {
    store: Arc<dyn MatchStore>,
}

impl HistoryGuard {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self { store }
    }

    pub async fn build_exclusion_map(
        &self,
        requester_id: Uuid,
        lookback_days: i64,
        now: DateTime<Utc>,
    ) -> Result<ExclusionMap, StoreError> {
        let since = now - Duration::days(lookback_days);
        let matches = self.store.find_matches_since(requester_id, since).await?;
        Ok(reduce_history(requester_id, &matches))
    }
}
