use std::sync::Arc;

use crate::gateway::SessionGateway;
use crate::matching::{MatchSettings, Matchmaker, RoleAssigner};
use crate::pool::PoolStore;
use crate::services::{MatchStore, ProfileProvider};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<SessionGateway>,
    pub matches: Arc<dyn MatchStore>,
}

impl AppState {
    pub fn new(
        pool: Arc<dyn PoolStore>,
        matches: Arc<dyn MatchStore>,
        profiles: Arc<dyn ProfileProvider>,
        roles: RoleAssigner,
        settings: MatchSettings,
    ) -> Self {
        let matchmaker = Arc::new(Matchmaker::new(
            pool.clone(),
            matches.clone(),
            profiles.clone(),
            settings,
        ));
        let gateway = Arc::new(SessionGateway::new(pool, profiles, matchmaker, roles));

        Self { gateway, matches }
    }
}
