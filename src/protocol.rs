use crate::error::SessionError;
use crate::session::SessionSnapshot;
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        session_id: SessionId,
        username: Username,
    },
    SubmitResponse {
        text: String,
    },
    CastVote {
        choice: ResponseSlot,
    },
    ResolveRound,
    NextRound,
    /// Close the current round early (e.g. a responder went quiet)
    ForceResolve,
    Leave,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        server_now: String,
    },
    /// Full session snapshot, broadcast after every successful mutation
    State {
        session: SessionSnapshot,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn welcome() -> Self {
        Self::Welcome {
            protocol: PROTOCOL_VERSION.to_string(),
            server_now: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}

impl From<&SessionError> for ServerMessage {
    fn from(e: &SessionError) -> Self {
        Self::error(e.code(), e.to_string())
    }
}
