//! The session aggregate: one match's complete state and lifecycle.
//!
//! Behavior is split across sibling modules the same way the state is
//! conceptually split:
//! - `prompt`: the draw-without-replacement prompt pool
//! - `round`: the round controller (joins, responses, votes, resolution)
//! - `score`: per-participant score and win detection
//! - `snapshot`: the immutable value copy handed to the transport
//!
//! A `Session` is plain synchronous data. Callers are expected to serialize
//! all mutations of one session (the server keeps each session behind its
//! own mutex).

mod prompt;
mod round;
mod score;
mod snapshot;

pub use prompt::PromptPool;
pub use snapshot::{LeaderboardEntry, ParticipantSummary, ResponseSnapshot, SessionSnapshot};

use crate::error::{ConfigError, SessionError};
use crate::types::*;

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    config: SessionConfig,
    /// Join order is significant: responders and win checks use it
    participants: Vec<Participant>,
    match_state: MatchState,
    round_state: RoundState,
    responders: Option<ResponderPair>,
    prompt: String,
    response_a: Response,
    response_b: Response,
    pool: PromptPool,
    round_no: u32,
    version: u64,
    /// Resolution of the current round, once resolved
    outcome: Option<RoundOutcome>,
    history: Vec<RoundOutcome>,
    winner: Option<Username>,
}

impl Session {
    /// Create a session with a fresh ULID and a randomly seeded pool
    pub fn new(config: SessionConfig, catalog: Vec<String>) -> Result<Self, ConfigError> {
        Self::with_pool(
            ulid::Ulid::new().to_string(),
            config,
            PromptPool::new(catalog),
        )
    }

    pub fn with_pool(
        id: SessionId,
        config: SessionConfig,
        pool: PromptPool,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id,
            config,
            participants: Vec::new(),
            match_state: MatchState::Waiting,
            round_state: RoundState::Inactive,
            responders: None,
            prompt: String::new(),
            response_a: Response::default(),
            response_b: Response::default(),
            pool,
            round_no: 0,
            version: 1,
            outcome: None,
            history: Vec::new(),
            winner: None,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn match_state(&self) -> MatchState {
        self.match_state
    }

    pub fn round_state(&self) -> RoundState {
        self.round_state
    }

    pub fn responders(&self) -> Option<&ResponderPair> {
        self.responders.as_ref()
    }

    pub fn current_prompt(&self) -> &str {
        &self.prompt
    }

    pub fn round_no(&self) -> u32 {
        self.round_no
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn participant(&self, username: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.username == username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.participant(username).is_some()
    }

    pub fn response(&self, slot: ResponseSlot) -> &Response {
        match slot {
            ResponseSlot::A => &self.response_a,
            ResponseSlot::B => &self.response_b,
        }
    }

    fn response_mut(&mut self, slot: ResponseSlot) -> &mut Response {
        match slot {
            ResponseSlot::A => &mut self.response_a,
            ResponseSlot::B => &mut self.response_b,
        }
    }

    fn participant_mut(&mut self, username: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.username == username)
    }

    fn slot_of(&self, username: &str) -> Option<ResponseSlot> {
        self.responders.as_ref()?.slot_of(username)
    }

    /// Participants allowed to vote this round (everyone but the responders)
    pub fn eligible_voters(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| self.slot_of(&p.username).is_none())
            .count()
    }

    pub fn votes_cast(&self) -> usize {
        self.response_a.voters.len() + self.response_b.voters.len()
    }

    fn has_voted(&self, username: &str) -> bool {
        self.response_a.voters.contains(username) || self.response_b.voters.contains(username)
    }

    fn wrong_phase(&self, operation: &'static str) -> SessionError {
        SessionError::WrongPhase {
            operation,
            match_state: self.match_state,
            round_state: self.round_state,
        }
    }

    /// Reset per-round state and open collection for a freshly drawn prompt
    fn begin_round(&mut self, prompt: String) {
        self.round_no += 1;
        self.prompt = prompt;
        self.response_a = Response::default();
        self.response_b = Response::default();
        self.outcome = None;
        self.round_state = RoundState::CollectingResponses;
        tracing::info!(
            "Session {} round {} started: {:?}",
            self.id,
            self.round_no,
            self.prompt
        );
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_waiting() {
        let session = Session::new(SessionConfig::default(), vec!["p".into()]).unwrap();

        assert_eq!(session.match_state(), MatchState::Waiting);
        assert_eq!(session.round_state(), RoundState::Inactive);
        assert_eq!(session.current_prompt(), "");
        assert_eq!(session.round_no(), 0);
        assert!(session.responders().is_none());
        assert!(!session.id().is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = Session::new(
            SessionConfig {
                max_participants: 1,
                max_points: 3,
            },
            Vec::new(),
        );
        assert!(matches!(result, Err(ConfigError::TooFewParticipants(1))));

        let result = Session::new(
            SessionConfig {
                max_participants: 3,
                max_points: 0,
            },
            Vec::new(),
        );
        assert!(matches!(result, Err(ConfigError::ZeroMaxPoints)));
    }

    #[test]
    fn test_sessions_get_unique_ids() {
        let a = Session::new(SessionConfig::default(), Vec::new()).unwrap();
        let b = Session::new(SessionConfig::default(), Vec::new()).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
