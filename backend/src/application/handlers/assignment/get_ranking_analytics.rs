//! GetRankingAnalyticsHandler - summary, trends and comparisons over a
//! user's ranking states.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::assignment::AssignmentError;
use crate::domain::foundation::{ProfileId, UserId};
use crate::domain::ranking::{ProfileComparison, ProfileTrend, RankingState, RankingStatsSummary};
use crate::ports::AssignmentStore;

#[derive(Debug, Clone)]
pub struct GetRankingAnalyticsQuery {
    pub user_id: UserId,
    /// Profiles to compare side by side; empty skips the comparison.
    pub compare: Vec<ProfileId>,
    pub top_limit: usize,
}

impl GetRankingAnalyticsQuery {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            compare: Vec::new(),
            top_limit: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingAnalyticsView {
    pub summary: RankingStatsSummary,
    pub trends: Vec<ProfileTrend>,
    pub comparison: Vec<ProfileComparison>,
    pub top_by_average: Vec<RankingState>,
}

pub struct GetRankingAnalyticsHandler {
    store: Arc<dyn AssignmentStore>,
}

impl GetRankingAnalyticsHandler {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetRankingAnalyticsQuery,
    ) -> Result<RankingAnalyticsView, AssignmentError> {
        let rankings = self
            .store
            .load(&query.user_id)
            .await?
            .map(|snapshot| snapshot.rankings)
            .ok_or_else(|| AssignmentError::unknown_user(query.user_id.clone()))?;

        Ok(RankingAnalyticsView {
            summary: rankings.stats_summary(),
            trends: rankings
                .iter()
                .filter_map(|s| rankings.profile_trend(s.profile_id()))
                .collect(),
            comparison: rankings.compare(&query.compare),
            top_by_average: rankings
                .top_by_average(query.top_limit)
                .into_iter()
                .cloned()
                .collect(),
        })
    }
}
