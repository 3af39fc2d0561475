//! Integration tests for the connection manager.
//!
//! Every test drives a [`ConnectionManager`] through a [`ScriptedConnector`],
//! plays the server side with a [`ScriptedPeer`], and runs on a paused Tokio
//! clock so reconnection delays are exact and instantaneous.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use explorer_client::infrastructure::transport::mock::{
    ConnectBehavior, ScriptedConnector, ScriptedPeer,
};
use explorer_client::infrastructure::transport::OutboundFrame;
use explorer_client::{ConnectionConfig, ConnectionManager, ConnectionSession};
use explorer_core::{decode_envelope, CloseCode, ConnectionState, ReconnectPolicy};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;

use explorer_core::ConnectionState::{Closed, Closing, Connecting, Open};

// ── Helpers ───────────────────────────────────────────────────────────────────

struct Harness {
    manager: ConnectionManager,
    connector: Arc<ScriptedConnector>,
    peers: UnboundedReceiver<ScriptedPeer>,
    states: Arc<Mutex<Vec<ConnectionState>>>,
}

fn harness(max_attempts: u32, delay_ms: u64) -> Harness {
    let (connector, peers) = ScriptedConnector::new();
    let manager = ConnectionManager::with_connector(
        ConnectionConfig {
            url: "ws://scripted.test".to_string(),
            policy: ReconnectPolicy {
                max_attempts,
                delay: Duration::from_millis(delay_ms),
            },
        },
        connector.clone(),
    );
    let states = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&states);
    manager.on_connection_state_change(move |s| log.lock().unwrap().push(s));
    Harness {
        manager,
        connector,
        peers,
        states,
    }
}

impl Harness {
    fn states(&self) -> Vec<ConnectionState> {
        self.states.lock().unwrap().clone()
    }

    /// Connects and returns the peer once the manager reports OPEN.
    async fn open(&mut self) -> ScriptedPeer {
        self.manager.connect();
        let peer = self.peers.recv().await.expect("connector dropped");
        wait_for(&self.manager, Open).await;
        peer
    }
}

async fn wait_for(manager: &ConnectionManager, state: ConnectionState) {
    let mut rx = manager.watch_state();
    tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| *s == state))
        .await
        .expect("state not reached")
        .expect("manager dropped");
}

/// Lets every ready task run without advancing the clock.
async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

fn recorder() -> (Arc<Mutex<Vec<Value>>>, impl Fn(Value) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |v| sink.lock().unwrap().push(v))
}

// ── connect() ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_connect_while_connecting_is_a_no_op() {
    // Arrange
    let h = harness(5, 3000);
    h.connector.set_behavior(ConnectBehavior::Hang);

    // Act
    h.manager.connect();
    settle().await;
    h.manager.connect();
    settle().await;

    // Assert
    assert_eq!(h.connector.connect_calls(), 1);
    assert_eq!(h.manager.connection_state(), Connecting);
    assert_eq!(h.states(), vec![Connecting]);
}

#[tokio::test(start_paused = true)]
async fn test_connect_while_open_is_a_no_op() {
    let mut h = harness(5, 3000);
    let _peer = h.open().await;

    h.manager.connect();
    settle().await;

    assert_eq!(h.connector.connect_calls(), 1);
    assert!(h.manager.is_connected());
    assert_eq!(h.states(), vec![Connecting, Open]);
}

#[tokio::test(start_paused = true)]
async fn test_connect_to_unusable_endpoint_reports_closed_without_retry() {
    let h = harness(5, 0);
    h.connector.set_behavior(ConnectBehavior::RejectEndpoint);

    h.manager.connect();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(h.connector.connect_calls(), 1);
    assert_eq!(h.states(), vec![Connecting, Closed]);
}

// ── Reconnection policy ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_normal_close_does_not_reconnect() {
    // Arrange
    let mut h = harness(5, 3000);
    let peer = h.open().await;

    // Act
    peer.close(CloseCode::NORMAL);
    wait_for(&h.manager, Closed).await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    // Assert
    assert_eq!(h.connector.connect_calls(), 1);
    assert_eq!(h.manager.reconnect_attempts(), 0);
    assert_eq!(h.states(), vec![Connecting, Open, Closed]);
}

#[tokio::test(start_paused = true)]
async fn test_abnormal_close_reconnects_once_after_fixed_delay() {
    // Arrange
    let mut h = harness(5, 3000);
    let peer = h.open().await;

    // Act: the peer goes away
    peer.close(CloseCode::ABNORMAL);
    wait_for(&h.manager, Closed).await;

    // Assert: one attempt scheduled, not yet made
    assert_eq!(h.manager.reconnect_attempts(), 1);
    tokio::time::sleep(Duration::from_millis(2999)).await;
    assert_eq!(h.connector.connect_calls(), 1);

    // Assert: made once the delay has elapsed
    tokio::time::sleep(Duration::from_millis(2)).await;
    let _second = h.peers.recv().await.unwrap();
    wait_for(&h.manager, Open).await;
    assert_eq!(h.connector.connect_calls(), 2);

    // Assert: OPEN resets the counter
    assert_eq!(h.manager.reconnect_attempts(), 0);
    assert_eq!(h.states(), vec![Connecting, Open, Closed, Connecting, Open]);
}

#[tokio::test(start_paused = true)]
async fn test_link_dropped_without_close_frame_counts_as_abnormal() {
    let mut h = harness(5, 100);
    let peer = h.open().await;

    drop(peer);
    wait_for(&h.manager, Closed).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let _second = h.peers.recv().await.unwrap();

    assert_eq!(h.connector.connect_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts_consecutive_failures() {
    // Arrange: max_attempts = 2, no delay, peer unreachable every time
    let h = harness(2, 0);
    h.connector.set_behavior(ConnectBehavior::Refuse);

    // Act
    h.manager.connect();
    tokio::time::sleep(Duration::from_secs(60)).await;

    // Assert: the manual attempt plus exactly two automatic ones, then silence
    assert_eq!(h.connector.connect_calls(), 3);
    assert_eq!(h.manager.connection_state(), Closed);
    assert_eq!(h.manager.reconnect_attempts(), 2);
    assert_eq!(
        h.states(),
        vec![Connecting, Closed, Connecting, Closed, Connecting, Closed]
    );
}

#[tokio::test(start_paused = true)]
async fn test_manual_connect_after_giving_up_starts_fresh_cycle() {
    // Arrange: exhaust the policy
    let mut h = harness(2, 0);
    h.connector.set_behavior(ConnectBehavior::Refuse);
    h.manager.connect();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.connector.connect_calls(), 3);

    // Act
    h.connector.set_behavior(ConnectBehavior::Accept);
    let _peer = h.open().await;

    // Assert
    assert_eq!(h.connector.connect_calls(), 4);
    assert_eq!(h.manager.reconnect_attempts(), 0);
}

// ── disconnect() ──────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_normally_and_never_reconnects() {
    // Arrange
    let mut h = harness(5, 0);
    let mut peer = h.open().await;

    // Act
    h.manager.disconnect();
    tokio::time::sleep(Duration::from_secs(60)).await;

    // Assert
    assert_eq!(
        peer.next_outbound().await,
        Some(OutboundFrame::Close(CloseCode::NORMAL))
    );
    assert_eq!(h.connector.connect_calls(), 1);
    assert_eq!(h.manager.connection_state(), Closed);
    assert_eq!(h.states(), vec![Connecting, Open, Closing, Closed]);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_reconnect() {
    let mut h = harness(5, 3000);
    let peer = h.open().await;
    peer.close(CloseCode::ABNORMAL);
    wait_for(&h.manager, Closed).await;

    h.manager.disconnect();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(h.connector.connect_calls(), 1);
    assert_eq!(h.manager.connection_state(), Closed);
}

#[tokio::test(start_paused = true)]
async fn test_connect_after_disconnect_opens_new_connection() {
    let mut h = harness(5, 0);
    let _first = h.open().await;
    h.manager.disconnect();

    let _second = h.open().await;

    assert_eq!(h.connector.connect_calls(), 2);
    assert!(h.manager.is_connected());
}

// ── send_message() ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_send_message_returns_false_unless_open() {
    // Arrange
    let h = harness(5, 3000);
    h.connector.set_behavior(ConnectBehavior::Hang);

    // Act + Assert: CLOSED
    assert!(!h.manager.send_message("generate", &json!({"text": "x"})));
    assert_eq!(h.manager.connection_state(), Closed);

    // Act + Assert: CONNECTING
    h.manager.connect();
    settle().await;
    assert!(!h.manager.send_message("generate", &json!({"text": "x"})));
    assert_eq!(h.manager.connection_state(), Connecting);
}

#[tokio::test(start_paused = true)]
async fn test_send_message_transmits_one_envelope_when_open() {
    let mut h = harness(5, 3000);
    let mut peer = h.open().await;

    let sent = h.manager.send_message("generate", &json!({"text": "orders"}));

    assert!(sent);
    let Some(OutboundFrame::Text(text)) = peer.next_outbound().await else {
        panic!("expected a text frame");
    };
    let envelope = decode_envelope(&text).unwrap();
    assert_eq!(envelope.message_type, "generate");
    assert_eq!(envelope.payload, json!({"text": "orders"}));
}

// ── Message handlers ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_handler_receives_payload_until_removed() {
    // Arrange
    let mut h = harness(5, 3000);
    let peer = h.open().await;
    let (seen, record) = recorder();
    h.manager.on_message("status", record);

    // Act
    peer.send_envelope("status", &json!({"n": 1}));
    settle().await;
    assert!(h.manager.remove_message_listener("status"));
    peer.send_envelope("status", &json!({"n": 2}));
    settle().await;

    // Assert
    assert_eq!(*seen.lock().unwrap(), vec![json!({"n": 1})]);
}

#[tokio::test(start_paused = true)]
async fn test_once_handler_fires_exactly_once() {
    let mut h = harness(5, 3000);
    let peer = h.open().await;
    let (seen, record) = recorder();
    h.manager.once_message("generate_response", record);

    peer.send_envelope("generate_response", &json!("first"));
    peer.send_envelope("generate_response", &json!("duplicate"));
    settle().await;

    assert_eq!(*seen.lock().unwrap(), vec![json!("first")]);
    assert!(!h.manager.has_message_listener("generate_response"));
}

#[tokio::test(start_paused = true)]
async fn test_later_registration_replaces_earlier() {
    let mut h = harness(5, 3000);
    let peer = h.open().await;
    let (first_seen, first) = recorder();
    let (second_seen, second) = recorder();
    h.manager.on_message("t", first);
    h.manager.on_message("t", second);

    peer.send_envelope("t", &json!(1));
    settle().await;

    assert!(first_seen.lock().unwrap().is_empty());
    assert_eq!(*second_seen.lock().unwrap(), vec![json!(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_and_unhandled_frames_are_dropped() {
    // Arrange
    let mut h = harness(5, 3000);
    let peer = h.open().await;
    let (seen, record) = recorder();
    h.manager.on_message("ok", record);

    // Act
    peer.send_text("not json");
    peer.send_text("[1,2,3]");
    peer.send_text(r#"{"payload":{"no":"type"}}"#);
    peer.send_envelope("nobody_listens", &json!({}));
    peer.send_envelope("ok", &json!("delivered"));
    settle().await;

    // Assert: only the routable frame got through, connection untouched
    assert_eq!(*seen.lock().unwrap(), vec![json!("delivered")]);
    assert_eq!(h.manager.connection_state(), Open);
}

#[tokio::test(start_paused = true)]
async fn test_frames_are_dispatched_in_arrival_order() {
    let mut h = harness(5, 3000);
    let peer = h.open().await;
    let (seen, record) = recorder();
    h.manager.on_message("seq", record);

    for n in 0..20 {
        peer.send_envelope("seq", &n);
    }
    settle().await;

    let expected: Vec<Value> = (0..20).map(|n| json!(n)).collect();
    assert_eq!(*seen.lock().unwrap(), expected);
}

// ── State observers ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_observers_run_in_registration_order_and_stop_after_removal() {
    // Arrange
    let mut h = harness(5, 3000);
    let log = Arc::new(Mutex::new(Vec::new()));
    let a_log = Arc::clone(&log);
    let a = h
        .manager
        .on_connection_state_change(move |s| a_log.lock().unwrap().push(format!("a:{s}")));
    let b_log = Arc::clone(&log);
    h.manager
        .on_connection_state_change(move |s| b_log.lock().unwrap().push(format!("b:{s}")));

    // Act
    let _peer = h.open().await;
    assert!(h.manager.remove_connection_state_listener(a));
    assert!(!h.manager.remove_connection_state_listener(a));
    h.manager.disconnect();

    // Assert
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "a:CONNECTING",
            "b:CONNECTING",
            "a:OPEN",
            "b:OPEN",
            "b:CLOSING",
            "b:CLOSED",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_observer_may_call_back_into_the_manager() {
    // Arrange: disconnect as soon as the connection opens
    let mut h = harness(5, 0);
    let manager = h.manager.clone();
    h.manager.on_connection_state_change(move |s| {
        if s == Open {
            manager.disconnect();
        }
    });

    // Act
    h.manager.connect();
    let _peer = h.peers.recv().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Assert: every observer saw OPEN before anyone saw CLOSING
    assert_eq!(h.states(), vec![Connecting, Open, Closing, Closed]);
    assert_eq!(h.manager.connection_state(), Closed);
    assert_eq!(h.connector.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_watch_state_follows_transitions() {
    let mut h = harness(5, 3000);
    let rx = h.manager.watch_state();
    assert_eq!(*rx.borrow(), Closed);

    let _peer = h.open().await;

    assert_eq!(*rx.borrow(), Open);
}

// ── Ownership ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_dropping_every_handle_leaves_connection_running() {
    // Arrange
    let mut h = harness(5, 3000);
    let mut peer = h.open().await;
    let Harness {
        manager,
        connector,
        mut peers,
        ..
    } = h;

    // Act: no disconnect(), just let the last handle go
    drop(manager);
    settle().await;
    let close_sent = peer.try_next_outbound();
    peer.close(CloseCode::ABNORMAL);
    tokio::time::sleep(Duration::from_millis(3000)).await;
    let reconnected = peers.recv().await;

    // Assert: the background tasks kept going on their own
    assert_eq!(close_sent, None);
    assert!(reconnected.is_some());
    assert_eq!(connector.connect_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_session_closes_normally_and_stops_reconnecting() {
    // Arrange
    let mut h = harness(5, 3000);
    let session = ConnectionSession::mount(h.manager.clone());
    let mut peer = h.peers.recv().await.unwrap();
    wait_for(&h.manager, Open).await;

    // Act
    drop(session);
    tokio::time::sleep(Duration::from_secs(60)).await;

    // Assert
    assert_eq!(
        peer.next_outbound().await,
        Some(OutboundFrame::Close(CloseCode::NORMAL))
    );
    assert_eq!(h.manager.connection_state(), Closed);
    assert_eq!(h.connector.connect_calls(), 1);
}
