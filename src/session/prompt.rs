use crate::error::{SessionError, SessionResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Prompts not yet used in this session, drawn uniformly without replacement
#[derive(Debug, Clone)]
pub struct PromptPool {
    remaining: Vec<String>,
    rng: StdRng,
}

impl PromptPool {
    pub fn new(catalog: Vec<String>) -> Self {
        Self {
            remaining: catalog,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Deterministic pool for tests and replays
    pub fn seeded(catalog: Vec<String>, seed: u64) -> Self {
        Self {
            remaining: catalog,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Remove and return a random prompt
    pub fn draw(&mut self) -> SessionResult<String> {
        if self.remaining.is_empty() {
            return Err(SessionError::PoolExhausted);
        }
        let idx = self.rng.random_range(0..self.remaining.len());
        Ok(self.remaining.remove(idx))
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}
