mod common;

use std::sync::Arc;

use blink::{
    errors::MatchError,
    matching::MatchOutcome,
    models::{Match, MatchStatus},
    pool::PoolStore,
};
use chrono::{Duration, Utc};
use futures::future::join_all;
use uuid::Uuid;

use crate::common::{ORIGIN, TestWorld, north_of_origin};

fn past_match(a: Uuid, b: Uuid, hours_ago: i64) -> Match {
    let at = Utc::now() - Duration::hours(hours_ago);
    Match {
        id: Uuid::new_v4(),
        requester_id: a,
        responder_id: b,
        status: MatchStatus::Accepted,
        created_at: at,
        updated_at: at,
    }
}

fn matched(outcome: MatchOutcome) -> blink::matching::MatchedPair {
    match outcome {
        MatchOutcome::Matched(pair) => pair,
        MatchOutcome::NoCandidate => panic!("expected a match"),
    }
}

#[tokio::test]
async fn better_score_beats_nearer_candidate() {
    let world = TestWorld::new();
    let requester = world.user(ORIGIN, 30).await;
    let b = world.waiting_responder(north_of_origin(5.0), 28, 2).await;
    let c = world.waiting_responder(north_of_origin(2.0), 45, 0).await;

    let pair = matched(world.matchmaker().find_match(requester).await.unwrap());

    assert_eq!(pair.responder_id, b.user_id);
    assert_eq!(pair.responder_entry_id, b.entry_id);
    assert_eq!(pair.requester_id, requester);
    assert_eq!(pair.room_id, pair.match_id);

    // The loser keeps waiting, the winner is gone
    assert!(world.pool.get_metadata(&b.entry_id).await.unwrap().is_none());
    assert!(world.pool.get_metadata(&c.entry_id).await.unwrap().is_some());
}

#[tokio::test]
async fn recent_partner_is_never_selected() {
    let world = TestWorld::new();
    let requester = world.user(ORIGIN, 30).await;
    // D would win on every component
    let d = world.waiting_responder(north_of_origin(1.0), 30, 10).await;
    let e = world.waiting_responder(north_of_origin(60.0), 38, 0).await;
    world.matches.insert(past_match(d.user_id, requester, 10)).await;

    let pair = matched(world.matchmaker().find_match(requester).await.unwrap());

    assert_eq!(pair.responder_id, e.user_id);
    assert!(world.pool.get_metadata(&d.entry_id).await.unwrap().is_some());
}

#[tokio::test]
async fn only_excluded_candidates_means_no_candidate() {
    let world = TestWorld::new();
    let requester = world.user(ORIGIN, 30).await;
    let d = world.waiting_responder(north_of_origin(1.0), 30, 10).await;
    world.matches.insert(past_match(requester, d.user_id, 1)).await;

    let outcome = world.matchmaker().find_match(requester).await.unwrap();

    assert_eq!(outcome, MatchOutcome::NoCandidate);
    assert!(world.pool.get_metadata(&d.entry_id).await.unwrap().is_some());
}

#[tokio::test]
async fn soft_penalty_can_flip_the_winner() {
    let world = TestWorld::new();
    let requester = world.user(ORIGIN, 30).await;
    // 98 + 50 + 0 - 50 = 98 vs 90 + 50 + 0 = 140
    let penalized = world.waiting_responder(north_of_origin(2.0), 30, 0).await;
    let fresh = world.waiting_responder(north_of_origin(10.0), 30, 0).await;
    world.matches.insert(past_match(requester, penalized.user_id, 72)).await;

    let pair = matched(world.matchmaker().find_match(requester).await.unwrap());
    assert_eq!(pair.responder_id, fresh.user_id);
}

#[tokio::test]
async fn own_pool_entry_is_skipped() {
    let world = TestWorld::new();
    let requester = world.user(ORIGIN, 30).await;
    let own = blink::models::PoolEntry {
        entry_id: "own-tab".to_string(),
        user_id: requester,
        location: ORIGIN,
        age: 30,
        gender_tag: None,
        joined_at: Utc::now(),
    };
    world.pool.add(&own).await.unwrap();

    let outcome = world.matchmaker().find_match(requester).await.unwrap();
    assert_eq!(outcome, MatchOutcome::NoCandidate);
}

#[tokio::test]
async fn candidates_beyond_radius_are_ignored() {
    let world = TestWorld::new();
    let requester = world.user(ORIGIN, 30).await;
    world.waiting_responder(north_of_origin(350.0), 30, 10).await;

    let outcome = world.matchmaker().find_match(requester).await.unwrap();
    assert_eq!(outcome, MatchOutcome::NoCandidate);
}

#[tokio::test]
async fn requester_without_profile_is_rejected() {
    let world = TestWorld::new();
    world.waiting_responder(north_of_origin(1.0), 30, 0).await;

    let result = world.matchmaker().find_match(Uuid::new_v4()).await;
    assert!(matches!(result, Err(MatchError::Validation(_))));
}

#[tokio::test]
async fn match_is_persisted_as_accepted() {
    let world = TestWorld::new();
    let requester = world.user(ORIGIN, 30).await;
    let responder = world.waiting_responder(north_of_origin(3.0), 31, 1).await;

    let pair = matched(world.matchmaker().find_match(requester).await.unwrap());

    let stored = world.matches.all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, pair.match_id);
    assert_eq!(stored[0].requester_id, requester);
    assert_eq!(stored[0].responder_id, responder.user_id);
    assert_eq!(stored[0].status, MatchStatus::Accepted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requesters_never_double_book() {
    let world = TestWorld::new();
    let responder = world.waiting_responder(north_of_origin(1.0), 30, 5).await;

    let mut requesters = Vec::new();
    for _ in 0..16 {
        requesters.push(world.user(ORIGIN, 30).await);
    }

    let matchmaker = Arc::new(world.matchmaker());
    let handles: Vec<_> = requesters
        .into_iter()
        .map(|requester| {
            let matchmaker = matchmaker.clone();
            tokio::spawn(async move { matchmaker.find_match(requester).await })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            MatchOutcome::Matched(pair) => {
                assert_eq!(pair.responder_id, responder.user_id);
                wins += 1;
            }
            MatchOutcome::NoCandidate => {}
        }
    }

    assert_eq!(wins, 1);
    let stored = world.matches.all().await;
    assert_eq!(
        stored.iter().filter(|m| m.responder_id == responder.user_id).count(),
        1
    );
    assert!(world.pool.get_metadata(&responder.entry_id).await.unwrap().is_none());
    assert!(world.pool.is_empty().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_requesters_fall_back_to_other_responders() {
    let world = TestWorld::new();
    let mut entries = Vec::new();
    for km in [1.0, 2.0, 3.0, 4.0] {
        entries.push(world.waiting_responder(north_of_origin(km), 30, 5).await);
    }
    let mut requesters = Vec::new();
    for _ in 0..4 {
        requesters.push(world.user(ORIGIN, 30).await);
    }

    let matchmaker = Arc::new(world.matchmaker());
    let handles: Vec<_> = requesters
        .into_iter()
        .map(|requester| {
            let matchmaker = matchmaker.clone();
            tokio::spawn(async move { matchmaker.find_match(requester).await })
        })
        .collect();

    let mut responders = Vec::new();
    for result in join_all(handles).await {
        if let MatchOutcome::Matched(pair) = result.unwrap().unwrap() {
            responders.push(pair.responder_id);
        }
    }

    // A requester only loses claims to the others, and there are fewer of them than responders
    assert_eq!(responders.len(), 4);
    responders.sort();
    responders.dedup();
    assert_eq!(responders.len(), 4);
    assert!(world.pool.is_empty().await);
}
