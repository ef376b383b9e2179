use axum::body::Body;
use axum::http::{Request, StatusCode};
use promptduel::config::ServerConfig;
use promptduel::protocol::{ClientMessage, ServerMessage};
use promptduel::state::AppState;
use promptduel::types::{MatchState, ResponseSlot, RoundState, SessionConfig};
use promptduel::ws::handlers::{handle_disconnect, handle_message};
use promptduel::ws::Connection;
use promptduel::SessionSnapshot;
use std::sync::Arc;
use tower::ServiceExt;

fn app_state(max_participants: usize, max_points: u32) -> Arc<AppState> {
    let config = ServerConfig {
        session: SessionConfig {
            max_participants,
            max_points,
        },
        ..ServerConfig::default()
    };
    let catalog = (1..=10).map(|i| format!("Prompt number {i}")).collect();
    Arc::new(AppState::new(config, catalog))
}

/// Send a message that should succeed and return the snapshot it produced,
/// as delivered on the connection's own subscription
async fn send(
    state: &Arc<AppState>,
    conn: &mut Connection,
    msg: ClientMessage,
) -> SessionSnapshot {
    let reply = handle_message(msg, conn, state).await;
    assert!(reply.is_none(), "Unexpected reply {:?}", reply);

    let rx = conn.updates.as_mut().expect("Connection is subscribed");
    let mut last = None;
    while let Ok(msg) = rx.try_recv() {
        if let ServerMessage::State { session } = msg {
            last = Some(session);
        }
    }
    last.expect("No snapshot was broadcast")
}

async fn join(state: &Arc<AppState>, session_id: &str, username: &str) -> Connection {
    let mut conn = Connection::new();
    send(
        state,
        &mut conn,
        ClientMessage::Join {
            session_id: session_id.to_string(),
            username: username.to_string(),
        },
    )
    .await;
    conn
}

/// End-to-end integration test for a complete match
#[tokio::test]
async fn test_full_match_flow() {
    let state = app_state(4, 2);

    let mut alice = join(&state, "room", "alice").await;
    let mut bob = join(&state, "room", "bob").await;
    let mut carol = join(&state, "room", "carol").await;

    let snap = state.snapshot("room").await.expect("Session should exist");
    assert_eq!(snap.match_state, MatchState::Waiting);

    let mut dave = join(&state, "room", "dave").await;
    let snap = state.snapshot("room").await.unwrap();
    assert_eq!(snap.match_state, MatchState::Active);
    assert_eq!(snap.round_state, RoundState::CollectingResponses);
    let responders = snap.responders.clone().expect("Responders assigned");
    assert_eq!((responders.a.as_str(), responders.b.as_str()), ("alice", "bob"));

    // Subscribe like a socket would, to check broadcasts
    let mut rx = state.subscribe("room").await.unwrap();

    for round in 1..=2 {
        send(
            &state,
            &mut alice,
            ClientMessage::SubmitResponse {
                text: format!("alice answer {round}"),
            },
        )
        .await;
        let snap = send(
            &state,
            &mut bob,
            ClientMessage::SubmitResponse {
                text: format!("bob answer {round}"),
            },
        )
        .await;
        assert_eq!(snap.round_state, RoundState::Voting);
        assert_eq!(snap.response_a.votes + snap.response_b.votes, 0);

        send(
            &state,
            &mut carol,
            ClientMessage::CastVote {
                choice: ResponseSlot::A,
            },
        )
        .await;
        let snap = send(
            &state,
            &mut dave,
            ClientMessage::CastVote {
                choice: ResponseSlot::A,
            },
        )
        .await;
        assert_eq!(snap.round_state, RoundState::RoundResolved);

        let snap = send(&state, &mut carol, ClientMessage::ResolveRound).await;
        assert_eq!(snap.participants["alice"].score, round);

        if round == 1 {
            assert_eq!(snap.match_state, MatchState::Active);
            let snap = send(&state, &mut carol, ClientMessage::NextRound).await;
            assert_eq!(snap.round_no, 2);
            assert_eq!(snap.round_state, RoundState::CollectingResponses);
        } else {
            assert_eq!(snap.match_state, MatchState::Ended);
            assert_eq!(snap.winner.as_deref(), Some("alice"));
            assert_eq!(snap.history.len(), 2);
        }
    }

    // Every successful mutation was broadcast, with increasing versions
    let mut last_version = 0;
    let mut broadcasts = 0;
    while let Ok(msg) = rx.try_recv() {
        match msg {
            ServerMessage::State { session } => {
                assert!(session.version > last_version);
                last_version = session.version;
                broadcasts += 1;
            }
            other => panic!("Unexpected broadcast {:?}", other),
        }
    }
    // 2 rounds x (2 responses + 2 votes + resolve) + 1 next round
    assert_eq!(broadcasts, 11);

    // Ended match rejects further actions
    let reply = handle_message(ClientMessage::NextRound, &mut carol, &state).await;
    match reply {
        Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "WRONG_PHASE"),
        other => panic!("Expected Error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_double_vote_rejected() {
    let state = app_state(3, 3);
    let mut alice = join(&state, "room", "alice").await;
    let mut bob = join(&state, "room", "bob").await;
    let mut carol = join(&state, "room", "carol").await;

    send(&state, &mut alice, ClientMessage::SubmitResponse { text: "x".into() }).await;
    send(&state, &mut bob, ClientMessage::SubmitResponse { text: "y".into() }).await;

    let mut extra = Connection::new();
    let reply = handle_message(
        ClientMessage::Join {
            session_id: "room".into(),
            username: "mallory".into(),
        },
        &mut extra,
        &state,
    )
    .await;
    assert!(matches!(reply, Some(ServerMessage::Error { ref code, .. }) if code == "SESSION_FULL"));

    send(
        &state,
        &mut carol,
        ClientMessage::CastVote {
            choice: ResponseSlot::B,
        },
    )
    .await;
    let reply = handle_message(
        ClientMessage::CastVote {
            choice: ResponseSlot::B,
        },
        &mut carol,
        &state,
    )
    .await;
    assert!(matches!(reply, Some(ServerMessage::Error { ref code, .. }) if code == "ALREADY_VOTED"));

    let snap = state.snapshot("room").await.unwrap();
    assert_eq!(snap.response_b.votes, 1);
}

#[tokio::test]
async fn test_responder_disconnect_ends_match() {
    let state = app_state(3, 3);
    let mut alice = join(&state, "room", "alice").await;
    let mut bob = join(&state, "room", "bob").await;
    let mut carol = join(&state, "room", "carol").await;

    handle_disconnect(&mut alice, &state).await;

    let snap = state.snapshot("room").await.unwrap();
    assert_eq!(snap.match_state, MatchState::Ended);
    assert!(snap.winner.is_none());
    assert!(!snap.participants.contains_key("alice"));

    // The finished session goes away once the last socket is gone
    handle_disconnect(&mut bob, &state).await;
    assert!(state.snapshot("room").await.is_some());
    handle_disconnect(&mut carol, &state).await;
    assert!(state.snapshot("room").await.is_none());
}

#[tokio::test]
async fn test_get_session_endpoint() {
    let state = app_state(3, 3);
    let _alice = join(&state, "room", "alice").await;
    let app = promptduel::router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sessions/room")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let snap: SessionSnapshot = serde_json::from_slice(&body).unwrap();
    assert_eq!(snap.id, "room");
    assert_eq!(snap.participants["alice"].score, 0);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sessions/nowhere")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
