//! Assignment engine error types.

use crate::domain::foundation::{DomainError, ErrorCode, UserId, ValidationError};

use super::ProfileMode;

/// Errors surfaced by the assignment engine.
///
/// Unknown feature names are not an error; they score zero.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentError {
    /// Observation is malformed for the active mode. Nothing was mutated.
    InvalidObservation { field: String, message: String },

    /// No assignment state exists for this user.
    UnknownUser(UserId),

    /// Assignment state already exists for this user.
    UserAlreadyExists(UserId),

    /// The requested mode change is not allowed.
    InvalidModeTransition { from: ProfileMode, to: ProfileMode },

    /// A concurrent update won the race; reload and retry.
    ConcurrentUpdateConflict(UserId),

    /// A port failed.
    Infrastructure(String),
}

impl AssignmentError {
    pub fn invalid_observation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AssignmentError::InvalidObservation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unknown_user(user_id: UserId) -> Self {
        AssignmentError::UnknownUser(user_id)
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        AssignmentError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AssignmentError::InvalidObservation { .. } => ErrorCode::InvalidObservation,
            AssignmentError::UnknownUser(_) => ErrorCode::UserNotFound,
            AssignmentError::UserAlreadyExists(_) => ErrorCode::UserAlreadyExists,
            AssignmentError::InvalidModeTransition { .. } => ErrorCode::InvalidStateTransition,
            AssignmentError::ConcurrentUpdateConflict(_) => ErrorCode::ConcurrentUpdateConflict,
            AssignmentError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AssignmentError::InvalidObservation { field, message } => {
                format!("Invalid observation field '{}': {}", field, message)
            }
            AssignmentError::UnknownUser(user_id) => {
                format!("No assignment state for user: {}", user_id)
            }
            AssignmentError::UserAlreadyExists(user_id) => {
                format!("Assignment state already exists for user: {}", user_id)
            }
            AssignmentError::InvalidModeTransition { from, to } => {
                format!("Cannot move profile mode from {} to {}", from, to)
            }
            AssignmentError::ConcurrentUpdateConflict(user_id) => {
                format!("Concurrent update for user {}; reload and retry", user_id)
            }
            AssignmentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// True when the caller may reasonably retry after reloading.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AssignmentError::ConcurrentUpdateConflict(_) | AssignmentError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for AssignmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AssignmentError {}

impl From<ValidationError> for AssignmentError {
    fn from(err: ValidationError) -> Self {
        AssignmentError::invalid_observation(err.field(), err.to_string())
    }
}

impl From<DomainError> for AssignmentError {
    fn from(err: DomainError) -> Self {
        let user = err
            .details
            .get("user_id")
            .and_then(|id| UserId::new(id.clone()).ok());
        match (err.code, user) {
            (ErrorCode::ConcurrentUpdateConflict, Some(user_id)) => {
                AssignmentError::ConcurrentUpdateConflict(user_id)
            }
            (ErrorCode::UserNotFound, Some(user_id)) => AssignmentError::UnknownUser(user_id),
            (ErrorCode::UserAlreadyExists, Some(user_id)) => {
                AssignmentError::UserAlreadyExists(user_id)
            }
            (ErrorCode::InvalidObservation, _) => AssignmentError::InvalidObservation {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => AssignmentError::Infrastructure(err.to_string()),
        }
    }
}

impl From<AssignmentError> for DomainError {
    fn from(err: AssignmentError) -> Self {
        let error = DomainError::new(err.code(), err.message());
        match &err {
            AssignmentError::UnknownUser(id)
            | AssignmentError::UserAlreadyExists(id)
            | AssignmentError::ConcurrentUpdateConflict(id) => {
                error.with_detail("user_id", id.to_string())
            }
            AssignmentError::InvalidObservation { field, .. } => {
                error.with_detail("field", field.clone())
            }
            _ => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-7").unwrap()
    }

    #[test]
    fn each_kind_has_distinct_code() {
        assert_eq!(
            AssignmentError::invalid_observation("intents", "empty").code(),
            ErrorCode::InvalidObservation
        );
        assert_eq!(AssignmentError::unknown_user(user()).code(), ErrorCode::UserNotFound);
        assert_eq!(
            AssignmentError::ConcurrentUpdateConflict(user()).code(),
            ErrorCode::ConcurrentUpdateConflict
        );
    }

    #[test]
    fn conflict_round_trips_through_domain_error() {
        let domain: DomainError = AssignmentError::ConcurrentUpdateConflict(user()).into();
        let back: AssignmentError = domain.into();
        assert_eq!(back, AssignmentError::ConcurrentUpdateConflict(user()));
    }

    #[test]
    fn database_errors_become_infrastructure() {
        let err: AssignmentError = DomainError::new(ErrorCode::DatabaseError, "boom").into();
        assert!(matches!(err, AssignmentError::Infrastructure(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_error_becomes_invalid_observation() {
        let err: AssignmentError = ValidationError::empty_field("intents").into();
        match err {
            AssignmentError::InvalidObservation { field, .. } => assert_eq!(field, "intents"),
            other => panic!("Expected InvalidObservation, got {:?}", other),
        }
    }

    #[test]
    fn invalid_observation_is_not_retryable() {
        assert!(!AssignmentError::invalid_observation("x", "y").is_retryable());
    }
}
