use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::history::HistoryGuard;
use super::scorer::{ScoredCandidate, rank_candidates, select_best};
use crate::constants::*;
use crate::errors::MatchError;
use crate::models::MatchStatus;
use crate::pool::{CandidateSource, PoolStore};
use crate::services::{MatchStore, ProfileProvider};
use crate::utils::{Config, retry_transient};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSettings {
    pub radius_km: f64,
    pub max_candidates: usize,
    pub lookback_days: i64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_SEARCH_RADIUS_KM,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            lookback_days: HISTORY_LOOKBACK_DAYS,
        }
    }
}

impl From<&Config> for MatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            radius_km: config.search_radius_km,
            max_candidates: config.max_candidates,
            lookback_days: HISTORY_LOOKBACK_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPair {
    pub match_id: Uuid,
    /// Chat/video room; same value as `match_id`
    pub room_id: Uuid,
    pub requester_id: Uuid,
    pub responder_id: Uuid,
    /// Connection handle of the claimed responder
    pub responder_entry_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(MatchedPair),
    NoCandidate,
}

/// One search per call: validate, fetch candidates and history, rank, claim the
/// best, persist the match.
///
/// The claim is the commit point. A lost claim falls back to the next-best
/// already-scored candidate without querying the pool again. A claimed entry is
/// never put back: if persisting the match fails the responder has left the pool.
pub struct Matchmaker {
    pool: Arc<dyn PoolStore>,
    candidates: CandidateSource,
    history: HistoryGuard,
    matches: Arc<dyn MatchStore>,
    profiles: Arc<dyn ProfileProvider>,
    settings: MatchSettings,
}

impl Matchmaker {
    pub fn new(
        pool: Arc<dyn PoolStore>,
        matches: Arc<dyn MatchStore>,
        profiles: Arc<dyn ProfileProvider>,
        settings: MatchSettings,
    ) -> Self {
        Self {
            candidates: CandidateSource::new(pool.clone()),
            history: HistoryGuard::new(matches.clone()),
            pool,
            matches,
            profiles,
            settings,
        }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub async fn find_match(&self, requester_id: Uuid) -> Result<MatchOutcome, MatchError> {
        self.find_match_at(requester_id, Utc::now()).await
    }

    /// Runs one search with `now` as the reference time for wait and history
    pub async fn find_match_at(
        &self,
        requester_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome, MatchError> {
        let profiles = &self.profiles;
        let requester = retry_transient("profile lookup", || {
            profiles.get_user_location_and_age(requester_id)
        })
        .await
        .map_err(|source| MatchError::TransientStore {
            operation: "profile lookup",
            source,
        })?
        .ok_or_else(|| MatchError::Validation(MISSING_PROFILE_MESSAGE.to_string()))?;

        if !requester.location.is_valid() {
            return Err(MatchError::Validation(INVALID_LOCATION_MESSAGE.to_string()));
        }

        let settings = self.settings;
        let candidates = &self.candidates;
        let found = retry_transient("candidate search", || {
            candidates.fetch(requester.location, settings.radius_km, settings.max_candidates)
        })
        .await
        .map_err(|source| MatchError::TransientStore {
            operation: "candidate search",
            source,
        })?;

        if found.is_empty() {
            tracing::info!(%requester_id, "no candidates in range");
            return Ok(MatchOutcome::NoCandidate);
        }

        let history = &self.history;
        let exclusions = retry_transient("history lookup", || {
            history.build_exclusion_map(requester_id, settings.lookback_days, now)
        })
        .await
        .map_err(|source| MatchError::TransientStore {
            operation: "history lookup",
            source,
        })?;

        let considered = found.len();
        let ranked = rank_candidates(requester_id, requester.age, found, &exclusions, now);
        tracing::debug!(
            %requester_id,
            considered,
            eligible = ranked.len(),
            "ranked candidates"
        );

        self.claim_and_commit(requester_id, ranked).await
    }

    /// Claims the best remaining candidate, falling back on lost races
    async fn claim_and_commit(
        &self,
        requester_id: Uuid,
        mut ranked: Vec<ScoredCandidate>,
    ) -> Result<MatchOutcome, MatchError> {
        while let Some(best) = select_best(&ranked) {
            // `remove` keeps the rest in ascending distance for the next selection
            let winner = ranked.remove(best);
            let entry = &winner.candidate.entry;

            let claimed = self
                .pool
                .claim(&entry.entry_id)
                .await
                .map_err(|source| MatchError::TransientStore {
                    operation: "claim",
                    source,
                })?;

            if !claimed {
                tracing::info!(
                    %requester_id,
                    entry_id = %entry.entry_id,
                    remaining = ranked.len(),
                    "claim lost to a concurrent search, trying next candidate"
                );
                continue;
            }

            let created = self
                .matches
                .create_match(requester_id, entry.user_id, MatchStatus::Accepted)
                .await;

            let m = match created {
                Ok(m) => m,
                Err(source) => {
                    tracing::error!(
                        %requester_id,
                        responder_id = %entry.user_id,
                        entry_id = %entry.entry_id,
                        "match persistence failed after claim; responder left the pool: {}",
                        source
                    );
                    return Err(MatchError::PersistenceAfterClaim {
                        entry_id: entry.entry_id.clone(),
                        responder_id: entry.user_id,
                        source,
                    });
                }
            };

            tracing::info!(
                match_id = %m.id,
                %requester_id,
                responder_id = %entry.user_id,
                distance_km = winner.candidate.distance_km,
                score = winner.score.total,
                "matched"
            );

            return Ok(MatchOutcome::Matched(MatchedPair {
                match_id: m.id,
                room_id: m.id,
                requester_id,
                responder_id: entry.user_id,
                responder_entry_id: entry.entry_id.clone(),
            }));
        }

        tracing::info!(%requester_id, "no selectable candidate");
        Ok(MatchOutcome::NoCandidate)
    }
}
