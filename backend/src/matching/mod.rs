pub mod history;
pub mod orchestrator;
pub mod roles;
pub mod scorer;

pub use history::{ExclusionMap, HistoryGuard, HistoryVerdict};
pub use orchestrator::{MatchOutcome, MatchSettings, MatchedPair, Matchmaker};
pub use roles::{Role, RoleAssigner};
pub use scorer::{ScoreBreakdown, ScoredCandidate};
