use super::Session;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Public view of a participant (the connection handle is never included)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantSummary {
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub username: Username,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseSnapshot {
    pub text: Option<String>,
    pub votes: u32,
}

impl From<&Response> for ResponseSnapshot {
    fn from(r: &Response) -> Self {
        Self {
            text: r.text.clone(),
            votes: r.votes(),
        }
    }
}

/// Owned copy of a session's state, safe to serialize and broadcast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub version: u64,
    pub participants: BTreeMap<Username, ParticipantSummary>,
    pub responders: Option<ResponderPair>,
    pub prompt: String,
    pub response_a: ResponseSnapshot,
    pub response_b: ResponseSnapshot,
    pub match_state: MatchState,
    pub round_state: RoundState,
    pub config: SessionConfig,
    pub round_no: u32,
    pub eligible_voters: usize,
    pub prompts_remaining: usize,
    pub last_outcome: Option<RoundOutcome>,
    pub history: Vec<RoundOutcome>,
    /// Highest score first
    pub leaderboard: Vec<LeaderboardEntry>,
    pub winner: Option<Username>,
}

impl Session {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            version: self.version,
            participants: self
                .participants
                .iter()
                .map(|p| (p.username.clone(), ParticipantSummary { score: p.score }))
                .collect(),
            responders: self.responders.clone(),
            prompt: self.prompt.clone(),
            response_a: (&self.response_a).into(),
            response_b: (&self.response_b).into(),
            match_state: self.match_state,
            round_state: self.round_state,
            config: self.config,
            round_no: self.round_no,
            eligible_voters: self.eligible_voters(),
            prompts_remaining: self.pool.remaining(),
            last_outcome: self.outcome.clone(),
            history: self.history.clone(),
            leaderboard: self.leaderboard(),
            winner: self.winner.clone(),
        }
    }
}
