//! Integration tests for the session state machine against a scripted
//! server on localhost.

mod support;

use std::time::Duration;

use asciiarena_match::{MatchProgress, MatchState};
use asciiarena_protocol::{
    LogInResult, LogInStatus, MapSnapshot, Message, PlayerId, ProtocolError,
};
use asciiarena_session::{
    Session, SessionError, SessionOutcome, SessionState,
};
use support::{FakeServer, small_map};
use tokio::sync::{mpsc, oneshot};

// =========================================================================
// Helpers
// =========================================================================

fn finishes_at(
    target: u32,
) -> impl FnMut(&MapSnapshot, &MatchState) -> MatchProgress + Send + 'static {
    move |_, state| {
        if state.frame_id >= target {
            MatchProgress::Finished
        } else {
            MatchProgress::Running
        }
    }
}

/// An action source holding the given actions, then nothing.
fn scripted_actions(actions: &[u32]) -> mpsc::UnboundedReceiver<u32> {
    let (tx, rx) = mpsc::unbounded_channel();
    for &action in actions {
        tx.send(action).unwrap();
    }
    rx
}

fn count(messages: &[Message], kind: &str) -> usize {
    messages.iter().filter(|m| m.kind() == kind).count()
}

fn never_finishes(_: &MapSnapshot, _: &MatchState) -> MatchProgress {
    MatchProgress::Running
}

/// `true` if nothing holds `port` anymore.
fn port_is_free(port: u16) -> bool {
    std::net::UdpSocket::bind(("0.0.0.0", port)).is_ok()
}

// =========================================================================
// Version check
// =========================================================================

#[tokio::test]
async fn test_rejected_version_sends_no_login() {
    let server = FakeServer::start().await;
    let config = server.config('A');

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        let announce = link.recv().await;
        link.send(Message::VersionAck {
            version: "9.9.9".to_string(),
            accepted: false,
        })
        .await;
        let rest = link.drain().await;
        (announce, rest)
    });

    let mut session = Session::connect(config).await.unwrap();
    assert_eq!(session.state(), SessionState::VersionChecking);

    let accepted = session.check_version().await.unwrap();
    assert!(!accepted);
    assert_eq!(session.state(), SessionState::Rejected);

    let (announce, rest) = script.await.unwrap();
    assert!(matches!(announce, Some(Message::VersionAnnounce { .. })));
    assert!(rest.is_empty(), "nothing may follow a rejection: {rest:?}");
}

#[tokio::test]
async fn test_run_reports_version_rejection_as_outcome() {
    let server = FakeServer::start().await;
    let config = server.config('A');

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.recv().await;
        link.send(Message::VersionAck {
            version: "0.0.1".to_string(),
            accepted: false,
        })
        .await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    let mut input = scripted_actions(&[]);
    let outcome = session.run(&mut input, || finishes_at(1)).await.unwrap();

    assert_eq!(outcome, SessionOutcome::VersionRejected);
    assert_eq!(count(&script.await.unwrap(), "LogInRequest"), 0);
}

#[tokio::test]
async fn test_unexpected_message_is_fatal_and_closes_session() {
    let server = FakeServer::start().await;
    let config = server.config('A');

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.recv().await;
        link.send(server.log_in_ok(1, &[])).await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    let err = session.check_version().await.unwrap_err();

    match err {
        SessionError::Protocol(ProtocolError::Unexpected { expected, received }) => {
            assert_eq!(expected, "VersionAck");
            assert_eq!(received, "LogInResult");
        }
        other => panic!("expected Unexpected, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Closed);
    // The server sees the control channel close.
    assert!(script.await.unwrap().is_empty());
}

#[tokio::test]
async fn test_step_in_wrong_state_is_invalid_state() {
    let server = FakeServer::start().await;
    let config = server.config('A');
    let _script = tokio::spawn(async move {
        let link = server.accept().await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    let err = session.log_in().await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::InvalidState {
            state: SessionState::VersionChecking,
            ..
        }
    ));
    // Nothing was sent, so the session is still usable.
    assert_eq!(session.state(), SessionState::VersionChecking);
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn test_login_rejection_is_an_outcome() {
    let server = FakeServer::start().await;
    let config = server.config('B');
    let frame_port = server.frame_port();

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        let requested = link.expect_login().await;
        link.send(Message::LogInResult(LogInResult {
            status: LogInStatus::PlayerAlreadyExists,
            server_udp_port: frame_port,
            required_players: 2,
            registered_players: vec![PlayerId('B')],
        }))
        .await;
        link.drain().await;
        requested
    });

    let expected_port = config.frame_port;
    let mut session = Session::connect(config).await.unwrap();
    let mut input = scripted_actions(&[]);
    let outcome = session.run(&mut input, || finishes_at(1)).await.unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::LoginRejected(LogInStatus::PlayerAlreadyExists)
    );
    assert_eq!(session.state(), SessionState::Rejected);
    assert!(session.frame_channel().is_none());
    assert_eq!(script.await.unwrap(), expected_port);
}

#[tokio::test]
async fn test_login_opens_frame_channel_and_seeds_roster() {
    let server = FakeServer::start().await;
    let config = server.config('C');
    let server_frame_port = server.frame_port();

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        link.expect_login().await;
        // Duplicates and extras beyond the requirement are dropped.
        link.send(server.log_in_ok(2, &['A', 'A', 'B', 'D'])).await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    assert!(session.check_version().await.unwrap());
    let result = session.log_in().await.unwrap();

    assert!(result.status.is_ok());
    assert_eq!(session.state(), SessionState::WaitingForPlayers);
    assert_eq!(session.roster().players(), &[PlayerId('A'), PlayerId('B')]);
    assert!(session.roster().is_complete());

    let frames = session.frame_channel().expect("frame channel should be open");
    assert_eq!(frames.peer_addr().port(), server_frame_port);

    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
    script.await.unwrap();
}

#[tokio::test]
async fn test_close_releases_frame_port() {
    let server = FakeServer::start().await;
    let config = server.config('A');
    let frame_port = config.frame_port;

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        link.expect_login().await;
        link.send(server.log_in_ok(1, &['A'])).await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    session.check_version().await.unwrap();
    session.log_in().await.unwrap();
    assert!(!port_is_free(frame_port));

    session.close().await;

    // The session value is still alive, but the port can be reused.
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.frame_channel().is_none());
    assert!(port_is_free(frame_port));
    script.await.unwrap();
}

// =========================================================================
// Matchmaking
// =========================================================================

#[tokio::test]
async fn test_loading_match_only_after_match_load() {
    let server = FakeServer::start().await;
    let config = server.config('A');
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        link.expect_login().await;
        link.send(server.log_in_ok(2, &[])).await;
        link.join('A').await;
        link.join('B').await;

        release_rx.await.unwrap();
        link.load_match(0).await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    session.check_version().await.unwrap();
    session.log_in().await.unwrap();

    let waiting = tokio::spawn(async move {
        let load = session.wait_for_match().await;
        (session, load)
    });

    // Both players are in, but no MatchLoad yet.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiting.is_finished());

    release_tx.send(()).unwrap();
    let (mut session, load) = waiting.await.unwrap();
    let load = load.unwrap();

    assert_eq!(session.state(), SessionState::LoadingMatch);
    assert_eq!(load.map, small_map());
    assert_eq!(session.roster().players(), &[PlayerId('A'), PlayerId('B')]);

    session.close().await;
    script.await.unwrap();
}

#[tokio::test]
async fn test_roster_tracks_leaves_and_ignores_absent_players() {
    let server = FakeServer::start().await;
    let config = server.config('A');

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        link.expect_login().await;
        link.send(server.log_in_ok(2, &['A'])).await;
        link.leave('Z').await;
        link.join('B').await;
        link.leave('B').await;
        link.join('C').await;
        link.load_match(0).await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    session.check_version().await.unwrap();
    session.log_in().await.unwrap();
    session.wait_for_match().await.unwrap();

    assert_eq!(session.roster().players(), &[PlayerId('A'), PlayerId('C')]);

    session.close().await;
    script.await.unwrap();
}

#[tokio::test]
async fn test_match_load_before_roster_complete_is_unexpected() {
    let server = FakeServer::start().await;
    let config = server.config('A');

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        link.expect_login().await;
        link.send(server.log_in_ok(3, &['A'])).await;
        link.load_match(0).await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    session.check_version().await.unwrap();
    session.log_in().await.unwrap();
    let err = session.wait_for_match().await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::Unexpected {
            expected: "PlayerConnectionEvent",
            received: "MatchLoad",
        })
    ));
    assert_eq!(session.state(), SessionState::Closed);
    script.await.unwrap();
}

// =========================================================================
// Match
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_actions_wait_for_match_start() {
    let server = FakeServer::start().await;
    let config = server.config('A');

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        link.expect_login().await;
        link.send(server.log_in_ok(1, &['A'])).await;
        link.load_match(1_500).await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    session.check_version().await.unwrap();
    session.log_in().await.unwrap();
    let load = session.wait_for_match().await.unwrap();

    let before = tokio::time::Instant::now();
    let game = session.load_match(load, finishes_at(1)).await.unwrap();

    assert!(before.elapsed() >= Duration::from_millis(1_500));
    assert_eq!(session.state(), SessionState::InMatch);
    assert_eq!(game.frame_id(), 0);
    assert!(session.current_match().is_some());

    session.close().await;
    assert!(game.is_finished());
    script.await.unwrap();
}

#[tokio::test]
async fn test_full_match_cycle() {
    let server = FakeServer::start().await;
    let config = server.config('A');

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        let mut seen = vec![link.accept_version().await];

        let login = link.recv().await.expect("client should log in");
        let Message::LogInRequest {
            player,
            requested_udp_port: client_port,
        } = login
        else {
            panic!("expected LogInRequest, got {login:?}");
        };
        assert_eq!(player, PlayerId('A'));
        seen.push(login);
        link.send(server.log_in_ok(1, &[])).await;
        link.join('A').await;
        link.load_match(0).await;

        // The first action means the client is in the match and its
        // listener is running.
        let action = link.recv().await.expect("client should act");
        seen.push(action);
        for frame_id in 1..=3 {
            server.send_frame(client_port, frame_id).await;
        }

        seen.extend(link.drain().await);
        seen
    });

    let mut session = Session::connect(config).await.unwrap();
    assert!(session.check_version().await.unwrap());
    session.log_in().await.unwrap();
    let load = session.wait_for_match().await.unwrap();
    let game = session.load_match(load, finishes_at(3)).await.unwrap();

    let mut input = scripted_actions(&[7]);
    let summary = session.play(&mut input).await.unwrap();

    assert_eq!(summary.state.frame_id, 3);
    assert!(summary.state.finished);
    assert_eq!(summary.actions_sent, 1);
    assert_eq!(game.frame_id(), 3);
    assert_eq!(session.state(), SessionState::WaitingForPlayers);
    assert!(session.current_match().is_none());

    session.close().await;
    let seen = script.await.unwrap();
    assert_eq!(count(&seen, "VersionAnnounce"), 1);
    assert_eq!(count(&seen, "LogInRequest"), 1);
    assert!(matches!(
        seen.last(),
        Some(Message::PlayerAction(action)) if action.action == 7 && action.frame_id == 0
    ));
}

#[tokio::test]
async fn test_run_plays_until_server_closes() {
    let server = FakeServer::start().await;
    let config = server.config('A');

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        let client_port = link.expect_login().await;
        link.send(server.log_in_ok(1, &['A'])).await;
        link.load_match(0).await;

        link.recv().await.expect("client should act");
        for frame_id in [1, 1, 2] {
            server.send_frame(client_port, frame_id).await;
        }
        // Hanging up between matches ends the session cleanly.
    });

    let mut session = Session::connect(config).await.unwrap();
    let mut input = scripted_actions(&[1]);
    let outcome = session.run(&mut input, || finishes_at(2)).await.unwrap();

    assert_eq!(outcome, SessionOutcome::ServerClosed { matches_played: 1 });
    assert_eq!(session.state(), SessionState::Closed);
    script.await.unwrap();
}

#[tokio::test]
async fn test_run_plays_consecutive_matches_with_the_same_roster() {
    let server = FakeServer::start().await;
    let config = server.config('A');

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        let client_port = link.expect_login().await;
        link.send(server.log_in_ok(2, &['A'])).await;
        link.join('B').await;

        link.load_match(0).await;
        link.recv().await.expect("client should act");
        for frame_id in [1, 2] {
            server.send_frame(client_port, frame_id).await;
        }

        // No join events: the roster from the first match still counts.
        // The frame socket is already bound, so these datagrams wait in
        // its buffer until the next listener reads them.
        link.load_match(0).await;
        for frame_id in [1, 2] {
            server.send_frame(client_port, frame_id).await;
        }
    });

    let mut session = Session::connect(config).await.unwrap();
    let mut input = scripted_actions(&[1]);
    let outcome = session.run(&mut input, || finishes_at(2)).await.unwrap();

    assert_eq!(outcome, SessionOutcome::ServerClosed { matches_played: 2 });
    assert_eq!(session.roster().players(), &[PlayerId('A'), PlayerId('B')]);
    script.await.unwrap();
}

#[tokio::test]
async fn test_cancelled_play_finishes_match_and_releases_frame_port() {
    let server = FakeServer::start().await;
    let config = server.config('A');
    let frame_port = config.frame_port;

    let script = tokio::spawn(async move {
        let link = server.accept().await;
        link.accept_version().await;
        link.expect_login().await;
        link.send(server.log_in_ok(1, &['A'])).await;
        link.load_match(0).await;
        link.drain().await
    });

    let mut session = Session::connect(config).await.unwrap();
    session.check_version().await.unwrap();
    session.log_in().await.unwrap();
    let load = session.wait_for_match().await.unwrap();
    let game = session.load_match(load, never_finishes).await.unwrap();

    let mut quiet = scripted_actions(&[]);
    let played = tokio::time::timeout(Duration::from_millis(50), session.play(&mut quiet)).await;
    assert!(played.is_err(), "the match never ends on its own");
    assert!(game.is_finished());

    drop(session);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(port_is_free(frame_port));
    assert!(script.await.unwrap().is_empty());
}
