pub mod protocol;
pub mod registry;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::constants::{
    MISSING_PROFILE_MESSAGE, NO_MATCH_FOUND_MESSAGE, STORE_UNAVAILABLE_MESSAGE,
    WAITING_IN_POOL_MESSAGE,
};
use crate::errors::MatchError;
use crate::matching::{MatchOutcome, Matchmaker, Role, RoleAssigner};
use crate::models::PoolEntry;
use crate::pool::PoolStore;
use crate::services::ProfileProvider;
use crate::utils::retry_transient;

pub use protocol::{ClientEvent, JoinPool, MatchFound, ServerEvent};
pub use registry::{Outbox, SessionRegistry};

/// Turns protocol events into pool and matchmaker calls and relays the outcome
/// to every participant's live connection.
pub struct SessionGateway {
    pool: Arc<dyn PoolStore>,
    profiles: Arc<dyn ProfileProvider>,
    matchmaker: Arc<Matchmaker>,
    roles: RoleAssigner,
    registry: SessionRegistry,
}

impl SessionGateway {
    pub fn new(
        pool: Arc<dyn PoolStore>,
        profiles: Arc<dyn ProfileProvider>,
        matchmaker: Arc<Matchmaker>,
        roles: RoleAssigner,
    ) -> Self {
        Self {
            pool,
            profiles,
            matchmaker,
            roles,
            registry: SessionRegistry::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub async fn connect(&self, entry_id: &str, outbox: Outbox) {
        self.registry.register(entry_id, outbox).await;
        tracing::debug!(%entry_id, "session connected");
    }

    /// Parses one inbound text frame and dispatches it
    pub async fn handle_text(&self, entry_id: &str, text: &str) {
        let event = match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(%entry_id, "invalid session frame: {}", e);
                self.notify(entry_id, ServerEvent::error(format!("Invalid message: {}", e)))
                    .await;
                return;
            }
        };

        match event {
            ClientEvent::JoinPool(join) => match Uuid::parse_str(join.user_id.trim()) {
                Ok(user_id) => {
                    self.join_pool(entry_id, user_id).await;
                }
                Err(_) => {
                    self.notify(entry_id, ServerEvent::error("Invalid user id")).await;
                }
            },
        }
    }

    /// Draws a role for this join and acts on it. Returns the drawn role.
    pub async fn join_pool(&self, entry_id: &str, user_id: Uuid) -> Role {
        let role = self.roles.assign();
        self.join_pool_as(entry_id, user_id, role).await;
        role
    }

    /// Joins with an already decided role
    pub async fn join_pool_as(&self, entry_id: &str, user_id: Uuid, role: Role) {
        tracing::info!(%entry_id, %user_id, role = role.as_str(), "join_pool");

        match role {
            Role::Responder => self.enqueue_responder(entry_id, user_id).await,
            Role::Requester => self.run_requester(entry_id, user_id).await,
        }
    }

    /// Connection is still open: keeps its pool entry, if any, from being swept
    pub async fn heartbeat(&self, entry_id: &str) {
        if let Err(e) = self.pool.touch(entry_id, Utc::now()).await {
            tracing::warn!(%entry_id, "failed to refresh pool entry liveness: {}", e);
        }
    }

    /// Connection ended: its pool entry must never be selectable again
    pub async fn disconnect(&self, entry_id: &str) {
        if let Err(e) = self.pool.remove(entry_id).await {
            tracing::error!(%entry_id, "failed to remove pool entry on disconnect: {}", e);
        }
        self.registry.unregister(entry_id).await;
        tracing::debug!(%entry_id, "session disconnected");
    }

    async fn enqueue_responder(&self, entry_id: &str, user_id: Uuid) {
        let profiles = &self.profiles;
        let profile = match retry_transient("profile lookup", || {
            profiles.get_user_location_and_age(user_id)
        })
        .await
        {
            Ok(Some(profile)) if profile.location.is_valid() => profile,
            Ok(_) => {
                self.notify(entry_id, ServerEvent::error(MISSING_PROFILE_MESSAGE))
                    .await;
                return;
            }
            Err(e) => {
                tracing::error!(%entry_id, %user_id, "profile lookup failed: {}", e);
                self.notify(entry_id, ServerEvent::error(STORE_UNAVAILABLE_MESSAGE))
                    .await;
                return;
            }
        };

        let entry = PoolEntry {
            entry_id: entry_id.to_string(),
            user_id,
            location: profile.location,
            age: profile.age,
            gender_tag: profile.gender_tag,
            joined_at: Utc::now(),
        };

        if let Err(e) = self.pool.add(&entry).await {
            tracing::error!(%entry_id, %user_id, "failed to add pool entry: {}", e);
            let message = "Could not join the pool. Please try again.";
            self.notify(entry_id, ServerEvent::error(message)).await;
            return;
        }

        self.notify(entry_id, ServerEvent::RoleAssigned { role: Role::Responder })
            .await;
        self.notify(
            entry_id,
            ServerEvent::WaitingInPool {
                message: WAITING_IN_POOL_MESSAGE.to_string(),
            },
        )
        .await;
    }

    async fn run_requester(&self, entry_id: &str, user_id: Uuid) {
        // A connection that was waiting as a responder stops waiting once it searches
        if let Err(e) = self.pool.remove(entry_id).await {
            tracing::warn!(%entry_id, "failed to drop previous pool entry: {}", e);
        }

        self.notify(entry_id, ServerEvent::RoleAssigned { role: Role::Requester })
            .await;

        match self.matchmaker.find_match(user_id).await {
            Ok(MatchOutcome::Matched(pair)) => {
                self.notify(
                    entry_id,
                    ServerEvent::MatchFound(MatchFound::for_participant(
                        &pair,
                        Role::Requester,
                    )),
                )
                .await;

                let delivered = self
                    .registry
                    .send(
                        &pair.responder_entry_id,
                        ServerEvent::MatchFound(MatchFound::for_participant(
                            &pair,
                            Role::Responder,
                        )),
                    )
                    .await;
                if !delivered {
                    tracing::warn!(
                        match_id = %pair.match_id,
                        responder_entry_id = %pair.responder_entry_id,
                        "responder connection not on this process or already closed"
                    );
                }
            }
            Ok(MatchOutcome::NoCandidate) => {
                self.notify(
                    entry_id,
                    ServerEvent::NoMatchFound {
                        message: NO_MATCH_FOUND_MESSAGE.to_string(),
                    },
                )
                .await;
            }
            Err(e) => {
                match &e {
                    MatchError::Validation(_) => {
                        tracing::info!(%user_id, "search rejected: {}", e)
                    }
                    _ => tracing::error!(%user_id, "search failed: {}", e),
                }
                self.notify(entry_id, ServerEvent::error(e.client_message())).await;
            }
        }
    }

    async fn notify(&self, entry_id: &str, event: ServerEvent) {
        if !self.registry.send(entry_id, event).await {
            tracing::debug!(%entry_id, "dropping event for closed connection");
        }
    }
}
