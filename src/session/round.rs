use super::{Session, SessionSnapshot};
use crate::error::{SessionError, SessionResult};
use crate::types::*;

impl Session {
    /// Add a participant. Reaching `max_participants` starts the match:
    /// the first two joiners become the responders and round 1 begins.
    pub fn add_participant(
        &mut self,
        username: &str,
        handle: ConnectionId,
    ) -> SessionResult<SessionSnapshot> {
        if self.match_state != MatchState::Waiting
            || self.participants.len() >= self.config.max_participants
        {
            return Err(SessionError::SessionFull);
        }
        if self.contains(username) {
            return Err(SessionError::DuplicateUsername(username.to_string()));
        }

        // Draw before inserting so an empty pool leaves the session untouched
        let activating = self.participants.len() + 1 == self.config.max_participants;
        let first_prompt = if activating {
            Some(self.pool.draw()?)
        } else {
            None
        };

        self.participants.push(Participant {
            username: username.to_string(),
            handle,
            score: 0,
        });
        tracing::info!(
            "{} joined session {} ({}/{})",
            username,
            self.id,
            self.participants.len(),
            self.config.max_participants
        );

        if let Some(prompt) = first_prompt {
            self.activate(prompt);
        }

        self.touch();
        Ok(self.snapshot())
    }

    fn activate(&mut self, prompt: String) {
        let responders = ResponderPair {
            a: self.participants[0].username.clone(),
            b: self.participants[1].username.clone(),
        };
        tracing::info!(
            "Session {} is active, responders: {} vs {}",
            self.id,
            responders.a,
            responders.b
        );
        self.responders = Some(responders);
        self.match_state = MatchState::Active;
        self.begin_round(prompt);
    }

    /// Store a responder's answer. Voting opens once both have answered.
    pub fn submit_response(
        &mut self,
        username: &str,
        text: String,
    ) -> SessionResult<SessionSnapshot> {
        if self.match_state == MatchState::Ended {
            return Err(self.wrong_phase("submit_response"));
        }
        let slot = self
            .slot_of(username)
            .ok_or_else(|| SessionError::NotAResponder(username.to_string()))?;
        if self.round_state != RoundState::CollectingResponses {
            return Err(self.wrong_phase("submit_response"));
        }
        if self.response(slot).is_submitted() {
            return Err(SessionError::AlreadySubmitted(username.to_string()));
        }

        tracing::debug!("{} submitted response {:?}", username, text);
        self.response_mut(slot).text = Some(text);

        if self.response_a.is_submitted() && self.response_b.is_submitted() {
            self.round_state = RoundState::Voting;
            tracing::info!(
                "Session {} round {} voting opened ({} eligible voters)",
                self.id,
                self.round_no,
                self.eligible_voters()
            );
        }

        self.touch();
        Ok(self.snapshot())
    }

    /// Record an observer's vote. The round becomes resolvable once every
    /// eligible voter has voted.
    pub fn cast_vote(
        &mut self,
        username: &str,
        choice: ResponseSlot,
    ) -> SessionResult<SessionSnapshot> {
        if self.match_state == MatchState::Ended {
            return Err(self.wrong_phase("cast_vote"));
        }
        if !self.contains(username) || self.slot_of(username).is_some() {
            return Err(SessionError::NotEligibleVoter(username.to_string()));
        }
        if self.round_state != RoundState::Voting {
            return Err(self.wrong_phase("cast_vote"));
        }
        if self.has_voted(username) {
            return Err(SessionError::AlreadyVoted(username.to_string()));
        }

        self.response_mut(choice).voters.insert(username.to_string());
        tracing::debug!(
            "{} voted {:?} ({}/{})",
            username,
            choice,
            self.votes_cast(),
            self.eligible_voters()
        );
        self.close_voting_if_complete();

        self.touch();
        Ok(self.snapshot())
    }

    /// Award the round to the response with strictly more votes. Equal
    /// tallies (including 0-0) are a draw and change no score.
    pub fn resolve_round(&mut self) -> SessionResult<SessionSnapshot> {
        if self.match_state != MatchState::Active
            || self.outcome.is_some()
            || !self.voting_complete()
        {
            return Err(self.wrong_phase("resolve_round"));
        }

        self.settle(self.leading_slot(), false)?;
        self.touch();
        Ok(self.snapshot())
    }

    /// Start the next round with the same responders after a resolved round
    pub fn draw_next_round(&mut self) -> SessionResult<SessionSnapshot> {
        if self.match_state != MatchState::Active
            || self.round_state != RoundState::RoundResolved
            || self.outcome.is_none()
        {
            return Err(self.wrong_phase("draw_next_round"));
        }

        let prompt = self.pool.draw()?;
        self.begin_round(prompt);
        self.touch();
        Ok(self.snapshot())
    }

    /// Close the current round early (abandonment, timeouts in the transport).
    ///
    /// A lone submitted response wins by forfeit; no responses is a draw;
    /// otherwise current tallies decide.
    pub fn force_resolve(&mut self) -> SessionResult<SessionSnapshot> {
        if self.match_state != MatchState::Active || self.outcome.is_some() {
            return Err(self.wrong_phase("force_resolve"));
        }

        let winner = match (self.response_a.is_submitted(), self.response_b.is_submitted()) {
            (true, true) => self.leading_slot(),
            (true, false) => Some(ResponseSlot::A),
            (false, true) => Some(ResponseSlot::B),
            (false, false) => None,
        };
        tracing::warn!(
            "Session {} round {} force-resolved from {:?}",
            self.id,
            self.round_no,
            self.round_state
        );

        self.settle(winner, true)?;
        self.touch();
        Ok(self.snapshot())
    }

    /// Remove a participant (disconnect or leave).
    ///
    /// Losing a responder ends the match without a winner. A departing
    /// observer's vote is retracted from the current tallies.
    pub fn remove_participant(&mut self, username: &str) -> SessionResult<SessionSnapshot> {
        if self.match_state == MatchState::Ended {
            return Err(self.wrong_phase("remove_participant"));
        }
        let idx = self
            .participants
            .iter()
            .position(|p| p.username == username)
            .ok_or_else(|| SessionError::UnknownParticipant(username.to_string()))?;

        let was_responder = self.slot_of(username).is_some();
        self.participants.remove(idx);
        tracing::info!("{} left session {}", username, self.id);

        if self.match_state == MatchState::Active {
            if was_responder {
                tracing::warn!(
                    "Responder {} left session {}, ending match",
                    username,
                    self.id
                );
                self.end_match(None);
            } else {
                // Live tallies only count present voters; a resolved
                // round keeps its numbers in `history`
                self.response_a.voters.remove(username);
                self.response_b.voters.remove(username);
                self.close_voting_if_complete();
            }
        }

        self.touch();
        Ok(self.snapshot())
    }

    fn voting_complete(&self) -> bool {
        matches!(
            self.round_state,
            RoundState::Voting | RoundState::RoundResolved
        ) && self.votes_cast() >= self.eligible_voters()
    }

    fn close_voting_if_complete(&mut self) {
        if self.round_state == RoundState::Voting
            && self.eligible_voters() > 0
            && self.votes_cast() >= self.eligible_voters()
        {
            self.round_state = RoundState::RoundResolved;
            tracing::info!(
                "Session {} round {} all votes in",
                self.id,
                self.round_no
            );
        }
    }

    fn leading_slot(&self) -> Option<ResponseSlot> {
        let (a, b) = (self.response_a.votes(), self.response_b.votes());
        if a > b {
            Some(ResponseSlot::A)
        } else if b > a {
            Some(ResponseSlot::B)
        } else {
            None
        }
    }

    /// Record the outcome, score the winner and end the match if they won
    fn settle(&mut self, winner: Option<ResponseSlot>, forced: bool) -> SessionResult<()> {
        let winner = match (winner, self.responders.as_ref()) {
            (Some(slot), Some(pair)) => Some(pair.get(slot).clone()),
            _ => None,
        };

        if let Some(ref name) = winner {
            let score = self.award_point(name)?;
            tracing::info!(
                "Session {} round {} won by {} (score {})",
                self.id,
                self.round_no,
                name,
                score
            );
        } else {
            tracing::info!("Session {} round {} is a draw", self.id, self.round_no);
        }

        let outcome = RoundOutcome {
            round_no: self.round_no,
            prompt: self.prompt.clone(),
            winner,
            votes_a: self.response_a.votes(),
            votes_b: self.response_b.votes(),
            forced,
        };
        self.history.push(outcome.clone());
        self.outcome = Some(outcome);
        self.round_state = RoundState::RoundResolved;

        if let Some(champion) = self.check_win() {
            self.end_match(Some(champion));
        }
        Ok(())
    }
}
