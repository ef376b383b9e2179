use super::{LeaderboardEntry, Session};
use crate::error::{SessionError, SessionResult};
use crate::types::*;

impl Session {
    /// Add exactly one point to a participant, returning the new score
    pub(crate) fn award_point(&mut self, username: &str) -> SessionResult<u32> {
        let participant = self
            .participant_mut(username)
            .ok_or_else(|| SessionError::UnknownParticipant(username.to_string()))?;
        participant.score += 1;
        Ok(participant.score)
    }

    /// First participant in join order whose score reached `max_points`
    pub fn check_win(&self) -> Option<Username> {
        self.participants
            .iter()
            .find(|p| p.score >= self.config.max_points)
            .map(|p| p.username.clone())
    }

    pub(crate) fn end_match(&mut self, winner: Option<Username>) {
        match &winner {
            Some(name) => tracing::info!("Session {} ended, winner: {}", self.id, name),
            None => tracing::info!("Session {} ended without a winner", self.id),
        }
        self.match_state = MatchState::Ended;
        self.round_state = RoundState::RoundResolved;
        self.winner = winner;
    }

    /// Participants ordered by score, highest first (join order breaks ties)
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut board: Vec<LeaderboardEntry> = self
            .participants
            .iter()
            .map(|p| LeaderboardEntry {
                username: p.username.clone(),
                score: p.score,
            })
            .collect();
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board
    }
}
