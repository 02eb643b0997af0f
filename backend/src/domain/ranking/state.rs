//! Per (user, profile) ranking accumulator.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProfileId, Timestamp};

/// How one profile has matched one user over time.
///
/// Only [`super::UserRankings`] mutates these; everything else sees
/// read-only accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingState {
    profile_id: ProfileId,
    cumulative_score: f64,
    observation_count: u64,
    max_score: f64,
    /// 1 = best. `None` until the profile has been ranked once.
    last_rank: Option<u32>,
    consecutive_top_count: u32,
    consecutive_drop_count: u32,
    updated_at: Option<Timestamp>,
}

impl RankingState {
    /// A state that has never observed anything.
    pub fn empty(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            cumulative_score: 0.0,
            observation_count: 0,
            max_score: 0.0,
            last_rank: None,
            consecutive_top_count: 0,
            consecutive_drop_count: 0,
            updated_at: None,
        }
    }

    /// Rebuilds a state from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        profile_id: ProfileId,
        cumulative_score: f64,
        observation_count: u64,
        max_score: f64,
        last_rank: Option<u32>,
        consecutive_top_count: u32,
        consecutive_drop_count: u32,
        updated_at: Option<Timestamp>,
    ) -> Self {
        Self {
            profile_id,
            cumulative_score,
            observation_count,
            max_score,
            last_rank,
            consecutive_top_count,
            consecutive_drop_count,
            updated_at,
        }
    }

    /// Folds one observation into the accumulator.
    pub(super) fn apply(&mut self, raw_score: f64, rank: u32, now: Timestamp) {
        self.cumulative_score += raw_score;
        self.observation_count += 1;
        self.max_score = self.max_score.max(raw_score);

        self.consecutive_top_count = if rank == 1 {
            self.consecutive_top_count + 1
        } else {
            0
        };
        self.consecutive_drop_count = match self.last_rank {
            Some(previous) if rank > previous => self.consecutive_drop_count + 1,
            _ => 0,
        };

        self.last_rank = Some(rank);
        self.updated_at = Some(now);
    }

    /// Marks a profile that was absent from the latest observation.
    pub(super) fn mark_unranked(&mut self, now: Timestamp) {
        self.last_rank = None;
        self.consecutive_top_count = 0;
        self.consecutive_drop_count = 0;
        self.updated_at = Some(now);
    }

    pub(super) fn clear_streaks(&mut self, now: Timestamp) {
        self.consecutive_top_count = 0;
        self.consecutive_drop_count = 0;
        self.updated_at = Some(now);
    }

    // ─── Accessors ───

    pub fn profile_id(&self) -> &ProfileId {
        &self.profile_id
    }

    pub fn cumulative_score(&self) -> f64 {
        self.cumulative_score
    }

    pub fn observation_count(&self) -> u64 {
        self.observation_count
    }

    /// Mean raw score; zero before the first observation.
    pub fn average_score(&self) -> f64 {
        if self.observation_count == 0 {
            0.0
        } else {
            self.cumulative_score / self.observation_count as f64
        }
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    pub fn last_rank(&self) -> Option<u32> {
        self.last_rank
    }

    pub fn is_top(&self) -> bool {
        self.last_rank == Some(1)
    }

    pub fn consecutive_top_count(&self) -> u32 {
        self.consecutive_top_count
    }

    pub fn consecutive_drop_count(&self) -> u32 {
        self.consecutive_drop_count
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }
}
