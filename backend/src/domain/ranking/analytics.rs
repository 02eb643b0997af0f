//! Read-only views over a user's ranking states.

use serde::Serialize;
use std::cmp::Ordering;

use super::{RankingState, UserRankings};
use crate::domain::foundation::{ProfileId, Timestamp, UserId};

/// Streak length at which a profile is flagged as unsettled.
const STREAK_FLAG_LENGTH: u32 = 3;

/// Streak length at which a trend is reported.
const TREND_STREAK_LENGTH: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreTrend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingStatsSummary {
    pub user_id: UserId,
    pub total_profiles: usize,
    pub top_profile_by_average: Option<ProfileId>,
    pub highest_average_score: f64,
    pub total_observations: u64,
    /// Profiles on a top or drop streak of three or more.
    pub profiles_with_streaks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileTrend {
    pub profile_id: ProfileId,
    pub current_rank: Option<u32>,
    pub average_score: f64,
    pub trend: ScoreTrend,
    pub observation_count: u64,
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileComparison {
    pub profile_id: ProfileId,
    pub average_score: f64,
    pub last_rank: Option<u32>,
    pub observation_count: u64,
    pub on_streak: bool,
}

fn has_streak(state: &RankingState) -> bool {
    state.consecutive_top_count() >= STREAK_FLAG_LENGTH
        || state.consecutive_drop_count() >= STREAK_FLAG_LENGTH
}

/// Higher average first, then better (lower) rank, unranked last.
fn by_average_then_rank(a: &RankingState, b: &RankingState) -> Ordering {
    b.average_score()
        .total_cmp(&a.average_score())
        .then_with(|| {
            let ra = a.last_rank().unwrap_or(u32::MAX);
            let rb = b.last_rank().unwrap_or(u32::MAX);
            ra.cmp(&rb)
        })
        .then_with(|| a.profile_id().cmp(b.profile_id()))
}

impl UserRankings {
    pub fn stats_summary(&self) -> RankingStatsSummary {
        let best = self.iter().min_by(|a, b| by_average_then_rank(a, b));
        RankingStatsSummary {
            user_id: self.user_id().clone(),
            total_profiles: self.len(),
            top_profile_by_average: best.map(|s| s.profile_id().clone()),
            highest_average_score: best.map(|s| s.average_score()).unwrap_or(0.0),
            total_observations: self.iter().map(|s| s.observation_count()).sum(),
            profiles_with_streaks: self.iter().filter(|s| has_streak(s)).count(),
        }
    }

    pub fn profile_trend(&self, profile_id: &ProfileId) -> Option<ProfileTrend> {
        let state = self.get(profile_id)?;
        let trend = if state.consecutive_top_count() >= TREND_STREAK_LENGTH {
            ScoreTrend::Improving
        } else if state.consecutive_drop_count() >= TREND_STREAK_LENGTH {
            ScoreTrend::Declining
        } else {
            ScoreTrend::Stable
        };
        Some(ProfileTrend {
            profile_id: profile_id.clone(),
            current_rank: state.last_rank(),
            average_score: state.average_score(),
            trend,
            observation_count: state.observation_count(),
            updated_at: state.updated_at(),
        })
    }

    /// Side-by-side view of the requested profiles; untracked IDs are skipped.
    pub fn compare(&self, profile_ids: &[ProfileId]) -> Vec<ProfileComparison> {
        let mut states: Vec<&RankingState> =
            profile_ids.iter().filter_map(|id| self.get(id)).collect();
        states.sort_by(|a, b| by_average_then_rank(a, b));
        states
            .into_iter()
            .map(|s| ProfileComparison {
                profile_id: s.profile_id().clone(),
                average_score: s.average_score(),
                last_rank: s.last_rank(),
                observation_count: s.observation_count(),
                on_streak: has_streak(s),
            })
            .collect()
    }

    pub fn top_by_average(&self, limit: usize) -> Vec<&RankingState> {
        let mut states: Vec<&RankingState> = self.iter().collect();
        states.sort_by(|a, b| by_average_then_rank(a, b));
        states.truncate(limit);
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::matching::MatchResult;

    fn pid(s: &str) -> ProfileId {
        ProfileId::new(s).unwrap()
    }

    fn observe(r: &mut UserRankings, scores: &[(&str, f64)]) {
        r.record_observation(
            &MatchResult::from_raw_scores(scores.iter().map(|(id, s)| (pid(id), *s))),
            Timestamp::now(),
        );
    }

    fn sample() -> UserRankings {
        let mut r = UserRankings::new(UserId::new("u").unwrap());
        observe(&mut r, &[("P1", 0.9), ("P2", 0.5), ("P3", 0.1)]);
        observe(&mut r, &[("P1", 0.9), ("P2", 0.5), ("P3", 0.1)]);
        observe(&mut r, &[("P1", 0.9), ("P2", 0.5), ("P3", 0.1)]);
        r
    }

    #[test]
    fn summary_reports_best_average_and_streaks() {
        let summary = sample().stats_summary();
        assert_eq!(summary.total_profiles, 3);
        assert_eq!(summary.top_profile_by_average, Some(pid("P1")));
        assert!((summary.highest_average_score - 0.9).abs() < 1e-9);
        assert_eq!(summary.total_observations, 9);
        assert_eq!(summary.profiles_with_streaks, 1);
    }

    #[test]
    fn summary_of_empty_rankings_is_zeroed() {
        let summary = UserRankings::new(UserId::new("u").unwrap()).stats_summary();
        assert_eq!(summary.total_profiles, 0);
        assert_eq!(summary.top_profile_by_average, None);
        assert_eq!(summary.highest_average_score, 0.0);
    }

    #[test]
    fn trend_reflects_streaks() {
        let mut r = sample();
        assert_eq!(r.profile_trend(&pid("P1")).unwrap().trend, ScoreTrend::Improving);
        assert_eq!(r.profile_trend(&pid("P2")).unwrap().trend, ScoreTrend::Stable);

        observe(&mut r, &[("P1", 0.2), ("P2", 0.5), ("P3", 0.1)]);
        observe(&mut r, &[("P1", 0.05), ("P2", 0.5), ("P3", 0.1)]);
        assert_eq!(r.profile_trend(&pid("P1")).unwrap().trend, ScoreTrend::Declining);
        assert!(r.profile_trend(&pid("P9")).is_none());
    }

    #[test]
    fn compare_sorts_by_average_and_skips_unknown() {
        let cmp = sample().compare(&[pid("P3"), pid("P1"), pid("P9")]);
        let ids: Vec<&str> = cmp.iter().map(|c| c.profile_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P3"]);
        assert!(cmp[0].on_streak);
    }

    #[test]
    fn top_by_average_limits_results() {
        let r = sample();
        let top = r.top_by_average(2);
        let ids: Vec<&str> = top.iter().map(|s| s.profile_id().as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }
}
