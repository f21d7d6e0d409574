use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::{MatchedPair, Role};

// Every frame is `{"event": "<name>", "data": {...}}`, e.g.
// {"event": "join_pool", "data": {"userId": "..."}}
// {"event": "match_found", "data": {"roomId": "...", "matchId": "...", "role": "requester", ...}}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinPool(JoinPool),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPool {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    RoleAssigned { role: Role },
    WaitingInPool { message: String },
    MatchFound(MatchFound),
    NoMatchFound { message: String },
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFound {
    pub room_id: Uuid,
    pub match_id: Uuid,
    pub requester_id: Uuid,
    pub responder_id: Uuid,
    /// Role of the participant receiving this frame
    pub role: Role,
}

impl MatchFound {
    pub fn for_participant(pair: &MatchedPair, role: Role) -> Self {
        Self {
            room_id: pair.room_id,
            match_id: pair.match_id,
            requester_id: pair.requester_id,
            responder_id: pair.responder_id,
            role,
        }
    }
}
