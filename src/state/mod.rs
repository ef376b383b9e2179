use crate::config::ServerConfig;
use crate::error::{ConfigError, SessionResult};
use crate::protocol::ServerMessage;
use crate::session::{PromptPool, Session, SessionSnapshot};
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

/// A live session plus the channel its snapshots are broadcast on.
///
/// The mutex serializes every mutation of one session; different sessions
/// never share a lock.
#[derive(Clone)]
pub struct SessionEntry {
    pub session: Arc<Mutex<Session>>,
    pub broadcast: broadcast::Sender<ServerMessage>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    pub config: Arc<ServerConfig>,
    catalog: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(config: ServerConfig, catalog: Vec<String>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
            catalog: Arc::new(catalog),
        }
    }

    /// Look up a session, creating it with the default config on first use
    pub async fn get_or_create_session(&self, id: &str) -> Result<SessionEntry, ConfigError> {
        if let Some(entry) = self.get_session(id).await {
            return Ok(entry);
        }

        let mut sessions = self.sessions.write().await;
        // Another connection may have created it while we waited for the lock
        if let Some(entry) = sessions.get(id) {
            return Ok(entry.clone());
        }

        let session = Session::with_pool(
            id.to_string(),
            self.config.session,
            PromptPool::new(self.catalog.as_ref().clone()),
        )?;
        let (tx, _rx) = broadcast::channel(100);
        let entry = SessionEntry {
            session: Arc::new(Mutex::new(session)),
            broadcast: tx,
        };
        sessions.insert(id.to_string(), entry.clone());
        tracing::info!("Created session {}", id);
        Ok(entry)
    }

    pub async fn get_session(&self, id: &str) -> Option<SessionEntry> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn snapshot(&self, id: &str) -> Option<SessionSnapshot> {
        let entry = self.get_session(id).await?;
        let session = entry.session.lock().await;
        Some(session.snapshot())
    }

    pub async fn subscribe(&self, id: &str) -> Option<broadcast::Receiver<ServerMessage>> {
        self.get_session(id)
            .await
            .map(|entry| entry.broadcast.subscribe())
    }

    /// Run one mutating operation under the session's lock and broadcast the
    /// resulting snapshot on success. Returns None for an unknown session.
    pub async fn apply<F>(&self, id: &str, op: F) -> Option<SessionResult<SessionSnapshot>>
    where
        F: FnOnce(&mut Session) -> SessionResult<SessionSnapshot>,
    {
        let entry = self.get_session(id).await?;
        self.apply_entry(id, &entry, op).await
    }

    /// Like `apply`, for a caller already holding the entry (e.g. one that
    /// subscribed before mutating). Returns None if the entry was pruned.
    pub async fn apply_entry<F>(
        &self,
        id: &str,
        entry: &SessionEntry,
        op: F,
    ) -> Option<SessionResult<SessionSnapshot>>
    where
        F: FnOnce(&mut Session) -> SessionResult<SessionSnapshot>,
    {
        let result = {
            let mut session = entry.session.lock().await;
            // Pruning removes entries only while holding their lock
            if !self.is_registered(id, entry).await {
                return None;
            }
            op(&mut *session)
        };

        match &result {
            Ok(snapshot) => {
                // Ignore send errors (no receivers connected is fine)
                let _ = entry.broadcast.send(ServerMessage::State {
                    session: snapshot.clone(),
                });
            }
            Err(e) => tracing::debug!("Session {} rejected operation: {}", id, e),
        }
        Some(result)
    }

    async fn is_registered(&self, id: &str, entry: &SessionEntry) -> bool {
        self.sessions
            .read()
            .await
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(&current.session, &entry.session))
    }

    /// Drop a session once nobody is left in it. An ended session keeps its
    /// participants, so it goes once no socket is subscribed anymore.
    ///
    /// The registry lock is never held while waiting on a session's lock.
    pub async fn prune_session(&self, id: &str) -> bool {
        loop {
            let Some(entry) = self.get_session(id).await else {
                return false;
            };
            if !Self::is_abandoned(&*entry.session.lock().await, &entry) {
                return false;
            }

            let mut sessions = self.sessions.write().await;
            match sessions.get(id) {
                Some(current) if Arc::ptr_eq(&current.session, &entry.session) => {}
                _ => return false,
            }
            let abandoned = match entry.session.try_lock() {
                Ok(session) => Self::is_abandoned(&session, &entry),
                // Busy again since the check; look once more without the registry lock
                Err(_) => continue,
            };
            if abandoned {
                sessions.remove(id);
                tracing::info!("Removed empty session {}", id);
            }
            return abandoned;
        }
    }

    fn is_abandoned(session: &Session, entry: &SessionEntry) -> bool {
        session.participant_count() == 0
            || (session.match_state() == MatchState::Ended
                && entry.broadcast.receiver_count() == 0)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default(), crate::catalog::builtin())
    }
}
