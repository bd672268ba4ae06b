use parley_client::{CallEvent, EngineEvent, NegotiationError, NegotiationEvent, Role};
use serde_json::json;
use std::time::Duration;

use super::start_session;
use crate::integration::init_tracing;
use crate::utils::{MockBehaviour, MockCall, MockEngine, expect_quiet, next_item};

#[tokio::test(start_paused = true)]
async fn test_unanswered_offer_times_out() {
    init_tracing();
    let engine = MockEngine::new();
    let mut s = start_session(&engine, Role::Initiator, false, Duration::from_millis(500)).await;

    s.handle.send(NegotiationEvent::CreateOffer);
    next_item(&mut s.sent).await;

    assert_eq!(
        next_item(&mut s.events).await,
        CallEvent::Failed {
            remote: s.remote.clone(),
            error: NegotiationError::Timeout,
        }
    );
    assert_eq!(
        next_item(&mut s.events).await,
        CallEvent::Closed {
            remote: s.remote.clone()
        }
    );
    assert_eq!(engine.calls().last(), Some(&MockCall::Close));
}

#[tokio::test(start_paused = true)]
async fn test_connected_session_ignores_deadline() {
    init_tracing();
    let engine = MockEngine::new();
    let mut s = start_session(&engine, Role::Responder, false, Duration::from_millis(500)).await;

    s.handle.send(NegotiationEvent::RemoteOffer(json!({"type": "offer", "sdp": "o"})));
    s.handle.send(NegotiationEvent::CreateAnswer);

    assert_eq!(
        next_item(&mut s.events).await,
        CallEvent::Connected {
            remote: s.remote.clone()
        }
    );
    expect_quiet(&mut s.events, 1500).await;
}

#[tokio::test]
async fn test_rejected_offer_fails_without_answer() {
    init_tracing();
    let engine = MockEngine::new();
    let mut s = start_session(&engine, Role::Responder, false, Duration::from_secs(30)).await;

    s.handle.send(NegotiationEvent::RemoteOffer(json!("not a description")));
    s.handle.send(NegotiationEvent::CreateAnswer);

    let failed = next_item(&mut s.events).await;
    assert!(
        matches!(
            failed,
            CallEvent::Failed {
                error: NegotiationError::NegotiationFailed(_),
                ..
            }
        ),
        "got {:?}",
        failed
    );
    assert_eq!(
        next_item(&mut s.events).await,
        CallEvent::Closed {
            remote: s.remote.clone()
        }
    );
    assert!(!engine.calls().contains(&MockCall::CreateAnswer));
    expect_quiet(&mut s.sent, 100).await;
}

#[tokio::test]
async fn test_media_failure_closes_session() {
    init_tracing();
    let engine = MockEngine::with_behaviour(MockBehaviour {
        auto_connect: false,
        ..MockBehaviour::default()
    });
    let mut s = start_session(&engine, Role::Initiator, false, Duration::from_secs(30)).await;
    s.handle.send(NegotiationEvent::CreateOffer);
    next_item(&mut s.sent).await;

    engine.emit(EngineEvent::Failed("ice failed".into()));

    assert_eq!(
        next_item(&mut s.events).await,
        CallEvent::Failed {
            remote: s.remote.clone(),
            error: NegotiationError::NegotiationFailed("ice failed".into()),
        }
    );
}

#[tokio::test]
async fn test_lost_signaling_fails_negotiation() {
    init_tracing();
    let engine = MockEngine::new();
    let mut s = start_session(&engine, Role::Initiator, false, Duration::from_secs(30)).await;
    drop(s.sent);

    s.handle.send(NegotiationEvent::CreateOffer);

    let failed = next_item(&mut s.events).await;
    assert!(matches!(
        failed,
        CallEvent::Failed {
            error: NegotiationError::NegotiationFailed(_),
            ..
        }
    ));
}
