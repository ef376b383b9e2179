use crate::types::{MatchState, RoundState, Username};

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Coarse grouping of session failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    PhaseViolation,
    IdentityViolation,
    RepeatedAction,
    ResourceExhaustion,
}

/// Errors returned by mutating session operations.
///
/// A failed operation never changes session state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("{operation} is not allowed while match is {match_state:?} and round is {round_state:?}")]
    WrongPhase {
        operation: &'static str,
        match_state: MatchState,
        round_state: RoundState,
    },

    #[error("Session is not accepting participants")]
    SessionFull,

    #[error("Username {0:?} is already taken")]
    DuplicateUsername(Username),

    #[error("{0:?} is not a responder this round")]
    NotAResponder(Username),

    #[error("{0:?} is not allowed to vote this round")]
    NotEligibleVoter(Username),

    #[error("{0:?} is not a participant")]
    UnknownParticipant(Username),

    #[error("{0:?} has already submitted a response")]
    AlreadySubmitted(Username),

    #[error("{0:?} has already voted this round")]
    AlreadyVoted(Username),

    #[error("No prompts left in the pool")]
    PoolExhausted,
}

impl SessionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::WrongPhase { .. } | Self::SessionFull => ErrorCategory::PhaseViolation,
            Self::DuplicateUsername(_)
            | Self::NotAResponder(_)
            | Self::NotEligibleVoter(_)
            | Self::UnknownParticipant(_) => ErrorCategory::IdentityViolation,
            Self::AlreadySubmitted(_) | Self::AlreadyVoted(_) => ErrorCategory::RepeatedAction,
            Self::PoolExhausted => ErrorCategory::ResourceExhaustion,
        }
    }

    /// Stable code for protocol error envelopes
    pub fn code(&self) -> &'static str {
        match self {
            Self::WrongPhase { .. } => "WRONG_PHASE",
            Self::SessionFull => "SESSION_FULL",
            Self::DuplicateUsername(_) => "DUPLICATE_USERNAME",
            Self::NotAResponder(_) => "NOT_A_RESPONDER",
            Self::NotEligibleVoter(_) => "NOT_ELIGIBLE_VOTER",
            Self::UnknownParticipant(_) => "UNKNOWN_PARTICIPANT",
            Self::AlreadySubmitted(_) => "ALREADY_SUBMITTED",
            Self::AlreadyVoted(_) => "ALREADY_VOTED",
            Self::PoolExhausted => "POOL_EXHAUSTED",
        }
    }
}

/// Errors in session or server configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("max_participants must be at least 2, got {0}")]
    TooFewParticipants(usize),

    #[error("max_points must be at least 1")]
    ZeroMaxPoints,

    #[error("Failed to read prompt catalog {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            SessionError::SessionFull.category(),
            ErrorCategory::PhaseViolation
        );
        assert_eq!(
            SessionError::NotAResponder("x".into()).category(),
            ErrorCategory::IdentityViolation
        );
        assert_eq!(
            SessionError::AlreadyVoted("x".into()).category(),
            ErrorCategory::RepeatedAction
        );
        assert_eq!(
            SessionError::PoolExhausted.category(),
            ErrorCategory::ResourceExhaustion
        );
    }

    #[test]
    fn test_wrong_phase_message() {
        let err = SessionError::WrongPhase {
            operation: "cast_vote",
            match_state: MatchState::Active,
            round_state: RoundState::CollectingResponses,
        };
        assert_eq!(err.code(), "WRONG_PHASE");
        assert!(err.to_string().contains("cast_vote"));
        assert!(err.to_string().contains("CollectingResponses"));
    }
}
