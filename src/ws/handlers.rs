//! WebSocket message dispatch
//!
//! Translates client messages into session operations. All game rules live in
//! `Session`; this layer only tracks which seat a connection holds.

use crate::error::{SessionError, SessionResult};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::SessionSnapshot;
use crate::state::AppState;
use crate::types::MatchState;
use std::sync::Arc;

use super::{Connection, Seat};

/// Macro to require a joined seat and return early otherwise
macro_rules! require_seat {
    ($conn:expr, $action:expr) => {
        match $conn.seat.clone() {
            Some(seat) => seat,
            None => {
                return Some(ServerMessage::error(
                    "NOT_JOINED",
                    format!("Join a session before you {}", $action),
                ));
            }
        }
    };
}

/// Map an operation result to the reply for the calling connection.
/// A subscribed connection gets new state through the broadcast only.
fn reply(
    conn: &Connection,
    result: Option<SessionResult<SessionSnapshot>>,
) -> Option<ServerMessage> {
    match result {
        Some(Ok(_)) if conn.updates.is_some() => None,
        Some(Ok(session)) => Some(ServerMessage::State { session }),
        Some(Err(e)) => Some((&e).into()),
        None => Some(ServerMessage::error(
            "UNKNOWN_SESSION",
            "Session no longer exists",
        )),
    }
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    conn: &mut Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join {
            session_id,
            username,
        } => handle_join(state, conn, session_id, username).await,

        ClientMessage::SubmitResponse { text } => {
            let seat = require_seat!(conn, "submit a response");
            let result = state
                .apply(&seat.session_id, |s| s.submit_response(&seat.username, text))
                .await;
            reply(conn, result)
        }

        ClientMessage::CastVote { choice } => {
            let seat = require_seat!(conn, "vote");
            let result = state
                .apply(&seat.session_id, |s| s.cast_vote(&seat.username, choice))
                .await;
            reply(conn, result)
        }

        ClientMessage::ResolveRound => {
            let seat = require_seat!(conn, "resolve a round");
            let result = state.apply(&seat.session_id, |s| s.resolve_round()).await;
            reply(conn, result)
        }

        ClientMessage::NextRound => {
            let seat = require_seat!(conn, "start a round");
            let result = state.apply(&seat.session_id, |s| s.draw_next_round()).await;
            reply(conn, result)
        }

        ClientMessage::ForceResolve => {
            let seat = require_seat!(conn, "close a round");
            let result = state.apply(&seat.session_id, |s| s.force_resolve()).await;
            reply(conn, result)
        }

        ClientMessage::Leave => {
            let seat = require_seat!(conn, "leave");
            handle_leave(state, conn, seat).await
        }
    }
}

async fn handle_join(
    state: &Arc<AppState>,
    conn: &mut Connection,
    session_id: String,
    username: String,
) -> Option<ServerMessage> {
    if let Some(seat) = &conn.seat {
        return Some(ServerMessage::error(
            "ALREADY_JOINED",
            format!("Already joined session {} as {}", seat.session_id, seat.username),
        ));
    }

    let entry = match state.get_or_create_session(&session_id).await {
        Ok(entry) => entry,
        Err(e) => {
            tracing::error!("Failed to create session {}: {}", session_id, e);
            return Some(ServerMessage::error("CONFIG_ERROR", e.to_string()));
        }
    };

    // Subscribe before joining so every later snapshot reaches this socket
    let updates = entry.broadcast.subscribe();
    let handle = conn.id.clone();
    let result = state
        .apply_entry(&session_id, &entry, |s| s.add_participant(&username, handle))
        .await;

    if matches!(result, Some(Ok(_))) {
        conn.seat = Some(Seat {
            session_id,
            username,
        });
        conn.updates = Some(updates);
    } else {
        // Do not leave behind a session that was created for a failed join
        drop(updates);
        state.prune_session(&session_id).await;
    }
    reply(conn, result)
}

async fn handle_leave(
    state: &Arc<AppState>,
    conn: &mut Connection,
    seat: Seat,
) -> Option<ServerMessage> {
    let result = state
        .apply(&seat.session_id, |s| s.remove_participant(&seat.username))
        .await;

    let final_state = match result {
        Some(Ok(session)) => Some(session),
        // A finished match keeps its roster; only the seat is given up
        Some(Err(SessionError::WrongPhase {
            match_state: MatchState::Ended,
            ..
        })) => state.snapshot(&seat.session_id).await,
        Some(Err(e)) => return Some((&e).into()),
        None => None,
    };

    release(state, conn, &seat).await;
    reply(conn, final_state.map(Ok))
}

/// Unseat and unsubscribe the connection, then drop the session if that
/// left it abandoned
async fn release(state: &Arc<AppState>, conn: &mut Connection, seat: &Seat) {
    conn.seat = None;
    conn.updates = None;
    state.prune_session(&seat.session_id).await;
}

/// Release the connection's seat when the socket goes away
pub async fn handle_disconnect(conn: &mut Connection, state: &Arc<AppState>) {
    let Some(seat) = conn.seat.clone() else {
        conn.updates = None;
        return;
    };

    let result = state
        .apply(&seat.session_id, |s| s.remove_participant(&seat.username))
        .await;
    release(state, conn, &seat).await;

    match result {
        Some(Ok(_)) => tracing::info!("{} disconnected from {}", seat.username, seat.session_id),
        // Ended sessions reject removal; the seat is simply dropped
        Some(Err(e)) => tracing::debug!("Disconnect of {} not applied: {}", seat.username, e),
        None => {}
    }
}
