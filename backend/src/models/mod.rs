pub mod matches;
pub mod pool;
pub mod users;

pub use matches::{Match, MatchStatus, MatchSummary};
pub use pool::{CandidateView, GeoPoint, PoolEntry};
pub use users::{UserLocation, UserProfileRow};
