use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque ID types for type safety
pub type SessionId = String;
pub type Username = String;
/// Transport-side handle for a participant's connection. Owned by the
/// collaborator; the session only stores it and never exposes it in snapshots.
pub type ConnectionId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchState {
    Waiting,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundState {
    Inactive,
    CollectingResponses,
    Voting,
    RoundResolved,
}

/// Which of the two responses a vote goes to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSlot {
    A,
    B,
}

/// The two participants answering prompts, fixed for the whole match
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponderPair {
    pub a: Username,
    pub b: Username,
}

impl ResponderPair {
    pub fn slot_of(&self, username: &str) -> Option<ResponseSlot> {
        if self.a == username {
            Some(ResponseSlot::A)
        } else if self.b == username {
            Some(ResponseSlot::B)
        } else {
            None
        }
    }

    pub fn get(&self, slot: ResponseSlot) -> &Username {
        match slot {
            ResponseSlot::A => &self.a,
            ResponseSlot::B => &self.b,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_participants: usize,
    pub max_points: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_participants: 3,
            max_points: 3,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_participants < 2 {
            return Err(ConfigError::TooFewParticipants(self.max_participants));
        }
        if self.max_points == 0 {
            return Err(ConfigError::ZeroMaxPoints);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub username: Username,
    pub handle: ConnectionId,
    pub score: u32,
}

/// One responder's answer for the current round.
///
/// Vote counts are derived from the set of voter identities, so a voter can
/// never be counted twice.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub text: Option<String>,
    pub voters: HashSet<Username>,
}

impl Response {
    pub fn votes(&self) -> u32 {
        self.voters.len() as u32
    }

    pub fn is_submitted(&self) -> bool {
        self.text.is_some()
    }
}

/// Result of a resolved round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundOutcome {
    pub round_no: u32,
    pub prompt: String,
    /// None when the round was a draw
    pub winner: Option<Username>,
    pub votes_a: u32,
    pub votes_b: u32,
    /// True when the round was closed early by the transport
    #[serde(default)]
    pub forced: bool,
}

impl RoundOutcome {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}
