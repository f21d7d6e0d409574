use std::sync::Mutex;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_RESPONDER_PROBABILITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Requester,
    Responder,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Responder => "responder",
        }
    }
}

/// Draws a role per join request. The probability and the random source are
/// injected so tests can force either role.
#[derive(Debug)]
pub struct RoleAssigner {
    responder_probability: f64,
    rng: Mutex<StdRng>,
}

impl RoleAssigner {
    pub fn new(responder_probability: f64, rng: StdRng) -> Self {
        Self {
            responder_probability: responder_probability.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    pub fn from_os_rng(responder_probability: f64) -> Self {
        Self::new(responder_probability, StdRng::from_os_rng())
    }

    /// Always hands out `role`
    pub fn fixed(role: Role) -> Self {
        let p = match role {
            Role::Responder => 1.0,
            Role::Requester => 0.0,
        };
        Self::new(p, StdRng::seed_from_u64(0))
    }

    pub fn responder_probability(&self) -> f64 {
        self.responder_probability
    }

    pub fn assign(&self) -> Role {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if rng.random_bool(self.responder_probability) {
            Role::Responder
        } else {
            Role::Requester
        }
    }
}

impl Default for RoleAssigner {
    fn default() -> Self {
        Self::from_os_rng(DEFAULT_RESPONDER_PROBABILITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_roles() {
        let responders = RoleAssigner::fixed(Role::Responder);
        let requesters = RoleAssigner::fixed(Role::Requester);
        for _ in 0..100 {
            assert_eq!(responders.assign(), Role::Responder);
            assert_eq!(requesters.assign(), Role::Requester);
        }
    }

    #[test]
    fn test_split_is_roughly_seventy_thirty() {
        let assigner = RoleAssigner::new(0.7, StdRng::seed_from_u64(42));
        let draws = 10_000;
        let responders = (0..draws)
            .filter(|_| assigner.assign() == Role::Responder)
            .count();
        let share = responders as f64 / draws as f64;
        assert!((0.67..0.73).contains(&share), "responder share {}", share);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = RoleAssigner::new(0.5, StdRng::seed_from_u64(7));
        let b = RoleAssigner::new(0.5, StdRng::seed_from_u64(7));
        let seq_a: Vec<Role> = (0..32).map(|_| a.assign()).collect();
        let seq_b: Vec<Role> = (0..32).map(|_| b.assign()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Requester).unwrap(), "\"requester\"");
        assert_eq!(Role::Responder.as_str(), "responder");
    }
}
