//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers take the user's lock and commit through the
//! assignment store; query handlers only read.

pub mod handlers;

pub use handlers::{
    // Assignment
    DetectDriftCommand, DetectDriftHandler, EnterDriftFallbackCommand,
    EvaluateObservationCommand, EvaluateObservationHandler, EvaluateObservationResult,
    ProcessDriftBatchCommand, ProcessDriftBatchHandler,
    PromoteToDynamicCommand, PromoteToDynamicHandler,
    RegisterUserCommand, RegisterUserHandler,
    ResetStreaksCommand, ResetStreaksHandler,
    UserLocks,
    // Queries
    AssignmentStatus, AssignmentStatusView, GetAssignmentStatusHandler, GetAssignmentStatusQuery,
    GetRankingAnalyticsHandler, GetRankingAnalyticsQuery, RankingAnalyticsView,
    // Event handlers
    DriftTrigger, DriftTriggerHandler, ObservationIntakeHandler, ObservationReceived,
    OBSERVATION_RECEIVED,
    // Expertise
    DecayExpertiseHandler, UpdateExpertiseCommand, UpdateExpertiseHandler,
};
