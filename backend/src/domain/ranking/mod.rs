//! Ranking state module.
//!
//! Tracks, per user and profile, how well each profile has matched the
//! user over time. Streak counters feed assignment and drift decisions.

mod analytics;
mod state;
mod user_rankings;

pub use analytics::{
    ProfileComparison, ProfileTrend, RankingStatsSummary, ScoreTrend,
};
pub use state::RankingState;
pub use user_rankings::UserRankings;
