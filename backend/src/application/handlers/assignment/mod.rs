//! Assignment command, query and event handlers.

mod detect_drift;
mod drift_trigger_handler;
mod evaluate_observation;
mod get_assignment_status;
mod get_ranking_analytics;
mod observation_intake_handler;
mod process_drift_batch;
mod promote_to_dynamic;
mod register_user;
mod reset_streaks;
mod user_locks;

#[cfg(test)]
pub(crate) mod test_support;

pub use detect_drift::{
    DetectDriftCommand, DetectDriftHandler, DetectDriftResult, EnterDriftFallbackCommand,
};
pub use drift_trigger_handler::{DriftTrigger, DriftTriggerHandler};
pub use evaluate_observation::{
    EvaluateObservationCommand, EvaluateObservationHandler, EvaluateObservationResult,
};
pub use get_assignment_status::{
    AssignmentStatus, AssignmentStatusView, GetAssignmentStatusHandler, GetAssignmentStatusQuery,
};
pub use get_ranking_analytics::{
    GetRankingAnalyticsHandler, GetRankingAnalyticsQuery, RankingAnalyticsView,
};
pub use observation_intake_handler::{
    ObservationIntakeHandler, ObservationReceived, OBSERVATION_RECEIVED,
};
pub use process_drift_batch::{
    ProcessDriftBatchCommand, ProcessDriftBatchHandler, ProcessDriftBatchResult,
};
pub use promote_to_dynamic::{
    PromoteToDynamicCommand, PromoteToDynamicHandler, PromoteToDynamicResult,
};
pub use register_user::{RegisterUserCommand, RegisterUserHandler, RegisterUserResult};
pub use reset_streaks::{ResetStreaksCommand, ResetStreaksHandler, ResetStreaksResult};
pub use user_locks::{UserLockGuard, UserLocks};
