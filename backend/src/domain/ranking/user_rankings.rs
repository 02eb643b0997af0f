//! A user's full set of ranking states.

use serde::Serialize;
use std::collections::BTreeMap;

use super::RankingState;
use crate::domain::foundation::{ProfileId, Timestamp, UserId};
use crate::domain::matching::MatchResult;

/// Every profile's ranking state for one user.
///
/// # Invariants
///
/// - after any observation, at most one state has `last_rank == 1`
///   and exactly one has a growing top streak
/// - states are only changed through [`UserRankings::record_observation`]
///   and the explicit [`UserRankings::reset_streaks`] intervention
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRankings {
    user_id: UserId,
    states: BTreeMap<ProfileId, RankingState>,
}

impl UserRankings {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            states: BTreeMap::new(),
        }
    }

    /// Rebuilds from stored rows.
    pub fn reconstitute(user_id: UserId, states: impl IntoIterator<Item = RankingState>) -> Self {
        let states = states
            .into_iter()
            .map(|s| (s.profile_id().clone(), s))
            .collect();
        Self { user_id, states }
    }

    /// Applies one match result to every profile as a single unit.
    ///
    /// Profiles tracked here but missing from the result (a catalog change)
    /// lose their rank and streaks so the single-leader invariant holds.
    /// Returns the updated states in rank order.
    pub fn record_observation(&mut self, result: &MatchResult, now: Timestamp) -> Vec<RankingState> {
        for (profile_id, state) in self.states.iter_mut() {
            if result.score_for(profile_id).is_none() {
                state.mark_unranked(now);
            }
        }

        result
            .ranked()
            .iter()
            .map(|score| {
                let state = self
                    .states
                    .entry(score.profile_id.clone())
                    .or_insert_with(|| RankingState::empty(score.profile_id.clone()));
                state.apply(score.raw_score, score.rank, now);
                state.clone()
            })
            .collect()
    }

    /// Zeroes the streak counters of one profile. Returns false if untracked.
    pub fn reset_streaks(&mut self, profile_id: &ProfileId, now: Timestamp) -> bool {
        match self.states.get_mut(profile_id) {
            Some(state) => {
                state.clear_streaks(now);
                true
            }
            None => false,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn get(&self, profile_id: &ProfileId) -> Option<&RankingState> {
        self.states.get(profile_id)
    }

    /// The profile ranked first at the latest observation.
    pub fn top(&self) -> Option<&RankingState> {
        self.states.values().find(|s| s.is_top())
    }

    /// States in ascending profile ID order.
    pub fn iter(&self) -> impl Iterator<Item = &RankingState> {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProfileId {
        ProfileId::new(s).unwrap()
    }

    fn rankings() -> UserRankings {
        UserRankings::new(UserId::new("user-1").unwrap())
    }

    fn result(scores: &[(&str, f64)]) -> MatchResult {
        MatchResult::from_raw_scores(scores.iter().map(|(id, s)| (pid(id), *s)))
    }

    #[test]
    fn consistent_leader_accumulates_top_streak() {
        let mut r = rankings();
        for _ in 0..4 {
            r.record_observation(
                &result(&[("P1", 0.2), ("P2", 0.3), ("P3", 0.8)]),
                Timestamp::now(),
            );
        }

        assert_eq!(r.get(&pid("P3")).unwrap().consecutive_top_count(), 4);
        assert_eq!(r.get(&pid("P1")).unwrap().consecutive_top_count(), 0);
        assert_eq!(r.get(&pid("P2")).unwrap().consecutive_top_count(), 0);
        assert_eq!(r.top().unwrap().profile_id(), &pid("P3"));
    }

    #[test]
    fn exactly_one_leader_after_each_observation() {
        let mut r = rankings();
        let sequences = [
            [("P1", 0.9), ("P2", 0.1), ("P3", 0.3)],
            [("P1", 0.1), ("P2", 0.9), ("P3", 0.3)],
            [("P1", 0.0), ("P2", 0.0), ("P3", 0.0)],
        ];
        for scores in sequences.iter() {
            r.record_observation(&result(scores), Timestamp::now());
            assert_eq!(r.iter().filter(|s| s.is_top()).count(), 1);
        }
    }

    #[test]
    fn leader_dropping_to_second_resets_top_and_counts_drop() {
        let mut r = rankings();
        r.record_observation(&result(&[("P1", 0.9), ("P3", 0.2)]), Timestamp::now());
        r.record_observation(&result(&[("P1", 0.9), ("P3", 0.2)]), Timestamp::now());
        r.record_observation(&result(&[("P1", 0.2), ("P3", 0.9)]), Timestamp::now());

        let p1 = r.get(&pid("P1")).unwrap();
        assert_eq!(p1.consecutive_top_count(), 0);
        assert_eq!(p1.consecutive_drop_count(), 1);
        assert_eq!(p1.last_rank(), Some(2));
    }

    #[test]
    fn average_reflects_raw_not_normalized_scores() {
        let mut r = rankings();
        r.record_observation(&result(&[("P1", 0.6), ("P2", 0.6)]), Timestamp::now());
        // Both normalize to 0.5 but keep their raw 0.6.
        assert!((r.get(&pid("P1")).unwrap().average_score() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn record_returns_states_in_rank_order() {
        let mut r = rankings();
        let updated =
            r.record_observation(&result(&[("P1", 0.1), ("P2", 0.5), ("P3", 0.3)]), Timestamp::now());
        let ids: Vec<&str> = updated.iter().map(|s| s.profile_id().as_str()).collect();
        assert_eq!(ids, vec!["P2", "P3", "P1"]);
    }

    #[test]
    fn profiles_missing_from_result_lose_rank() {
        let mut r = rankings();
        r.record_observation(&result(&[("P9", 0.9), ("P1", 0.1)]), Timestamp::now());
        r.record_observation(&result(&[("P1", 0.1), ("P2", 0.05)]), Timestamp::now());

        let stale = r.get(&pid("P9")).unwrap();
        assert_eq!(stale.last_rank(), None);
        assert_eq!(stale.consecutive_top_count(), 0);
        assert_eq!(r.top().unwrap().profile_id(), &pid("P1"));
    }

    #[test]
    fn reset_streaks_keeps_rank_and_scores() {
        let mut r = rankings();
        for _ in 0..3 {
            r.record_observation(&result(&[("P1", 0.9), ("P2", 0.1)]), Timestamp::now());
        }
        assert!(r.reset_streaks(&pid("P1"), Timestamp::now()));

        let p1 = r.get(&pid("P1")).unwrap();
        assert_eq!(p1.consecutive_top_count(), 0);
        assert_eq!(p1.last_rank(), Some(1));
        assert_eq!(p1.observation_count(), 3);
        assert!(!r.reset_streaks(&pid("P7"), Timestamp::now()));
    }
}
