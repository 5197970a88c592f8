//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Every variant belongs to one of three reporting classes (see
/// [`ErrorKind`]); none of them changes state when returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Cannot build a speaking order from an empty participant set")]
    EmptyParticipantSet,

    #[error("A run is already active for meeting {0}")]
    AlreadyRunning(String),

    #[error("Meeting {meeting_id} is not running")]
    NotRunning { meeting_id: String },

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("Unknown participant role: {0}")]
    InvalidRole(String),

    #[error("Unknown participant status: {0}")]
    InvalidStatus(String),

    #[error("Unknown control action: {0}")]
    InvalidAction(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

/// Reporting class of a [`DomainError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input or enum value
    Validation,
    /// Operation conflicts with the current lifecycle state
    StateConflict,
    /// Referenced meeting, run, order or participant does not exist
    NotFound,
}

impl DomainError {
    pub fn not_found(what: &'static str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            what,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::AlreadyRunning(_) | DomainError::NotRunning { .. } => {
                ErrorKind::StateConflict
            }
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::EmptyParticipantSet
            | DomainError::InvalidRole(_)
            | DomainError::InvalidStatus(_)
            | DomainError::InvalidAction(_)
            | DomainError::InvalidEvent(_) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DomainError::not_found("speaking order", "run_1");
        assert_eq!(error.to_string(), "speaking order not found: run_1");
        assert_eq!(
            DomainError::AlreadyRunning("m1".into()).to_string(),
            "A run is already active for meeting m1"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            DomainError::AlreadyRunning("m1".into()).kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            DomainError::InvalidAction("jump".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            DomainError::not_found("participant", "a").kind(),
            ErrorKind::NotFound
        );
    }
}
