use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::history::{ExclusionMap, HistoryVerdict, verdict};
use crate::constants::*;
use crate::models::CandidateView;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub distance: f64,
    pub age: f64,
    pub wait: f64,
    pub penalty: f64,
    pub total: f64,
}

/// ```text
/// distance = max(0, 100 - km)
/// age      = max(0, 50 - 5 * |age difference|)
/// wait     = min(50, 5 * minutes waited)
/// total    = distance + age + wait - history penalty
/// ```
pub fn score(
    requester_age: u32,
    candidate_age: u32,
    distance_km: f64,
    wait_minutes: f64,
    penalty: u32,
) -> ScoreBreakdown {
    let distance = (MAX_DISTANCE_SCORE - distance_km).max(0.0);
    let age_gap = requester_age.abs_diff(candidate_age) as f64;
    let age = (MAX_AGE_SCORE - AGE_SCORE_PER_YEAR * age_gap).max(0.0);
    let wait = (WAIT_SCORE_PER_MINUTE * wait_minutes.max(0.0)).min(MAX_WAIT_SCORE);
    let penalty = penalty as f64;

    ScoreBreakdown {
        distance,
        age,
        wait,
        penalty,
        total: distance + age + wait - penalty,
    }
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: CandidateView,
    pub score: ScoreBreakdown,
}

/// Scores every eligible candidate, preserving the input (ascending distance) order.
/// The requester's own entries and hard-excluded partners are dropped before scoring.
pub fn rank_candidates(
    requester_id: Uuid,
    requester_age: u32,
    candidates: Vec<CandidateView>,
    history: &ExclusionMap,
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate> {
    candidates
        .into_iter()
        .filter(|c| c.entry.user_id != requester_id)
        .filter_map(|c| {
            let penalty = match verdict(history.get(&c.entry.user_id).copied(), now) {
                HistoryVerdict::Excluded => return None,
                HistoryVerdict::Penalty(p) => p,
            };
            let score = score(
                requester_age,
                c.entry.age,
                c.distance_km,
                c.entry.wait_minutes(now),
                penalty,
            );
            Some(ScoredCandidate { candidate: c, score })
        })
        .collect()
}

/// Index of the winning candidate; `ranked` must be in ascending distance order.
/// Among equal totals the nearest wins.
pub fn select_best(ranked: &[ScoredCandidate]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in ranked.iter().enumerate() {
        // Strictly greater: the nearest candidate keeps a tied score
        if best.is_none_or(|(_, top)| c.score.total > top) {
            best = Some((i, c.score.total));
        }
    }
    best.map(|(i, _)| i)
}
