use parley_client::{CallEvent, EngineEvent, NegotiationEvent, RemoteStream, Role};
use parley_core::ClientSignal;
use serde_json::json;
use std::time::Duration;

use super::start_session;
use crate::integration::init_tracing;
use crate::utils::{MockCall, MockEngine, next_item, wait_for};

const TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::test]
async fn test_initiator_offers_then_connects_on_answer() {
    init_tracing();
    let engine = MockEngine::new();
    let mut s = start_session(&engine, Role::Initiator, false, TIMEOUT).await;

    s.handle.send(NegotiationEvent::CreateOffer);

    assert_eq!(
        next_item(&mut s.sent).await,
        ClientSignal::Offer {
            target: s.remote.clone(),
            caller: s.local.clone(),
            sdp: json!({"type": "offer", "sdp": "mock-offer"}),
        }
    );

    let answer = json!({"type": "answer", "sdp": "remote-answer"});
    s.handle.send(NegotiationEvent::RemoteAnswer(answer.clone()));

    assert_eq!(
        next_item(&mut s.events).await,
        CallEvent::Connected {
            remote: s.remote.clone()
        }
    );
    assert_eq!(
        engine.calls(),
        vec![
            MockCall::CreatePeer(Role::Initiator),
            MockCall::CreateOffer,
            MockCall::SetRemote(answer),
        ]
    );
}

#[tokio::test]
async fn test_responder_answers_buffered_offer() {
    init_tracing();
    let engine = MockEngine::new();
    let mut s = start_session(&engine, Role::Responder, false, TIMEOUT).await;
    let offer = json!({"type": "offer", "sdp": "remote-offer"});

    s.handle.send(NegotiationEvent::RemoteOffer(offer.clone()));
    s.handle.send(NegotiationEvent::CreateAnswer);

    assert_eq!(
        next_item(&mut s.sent).await,
        ClientSignal::Answer {
            caller: s.remote.clone(),
            sdp: json!({"type": "answer", "sdp": "mock-answer"}),
        }
    );
    assert_eq!(
        next_item(&mut s.events).await,
        CallEvent::Connected {
            remote: s.remote.clone()
        }
    );
    assert_eq!(
        engine.calls(),
        vec![
            MockCall::CreatePeer(Role::Responder),
            MockCall::SetRemote(offer),
            MockCall::CreateAnswer,
        ]
    );
}

#[tokio::test]
async fn test_repeated_create_offer_sends_one_offer() {
    init_tracing();
    let engine = MockEngine::new();
    let mut s = start_session(&engine, Role::Initiator, false, TIMEOUT).await;

    s.handle.send(NegotiationEvent::CreateOffer);
    s.handle.send(NegotiationEvent::CreateOffer);
    next_item(&mut s.sent).await;

    crate::utils::expect_quiet(&mut s.sent, 200).await;
    let offers = engine
        .calls()
        .into_iter()
        .filter(|c| *c == MockCall::CreateOffer)
        .count();
    assert_eq!(offers, 1);
}

#[tokio::test]
async fn test_remote_stream_is_reported() {
    init_tracing();
    let engine = MockEngine::new();
    let mut s = start_session(&engine, Role::Initiator, false, TIMEOUT).await;
    let stream = RemoteStream {
        stream_id: "s1".into(),
        track_id: "t1".into(),
        kind: "video".into(),
    };

    engine.emit(EngineEvent::RemoteStream(stream.clone()));

    assert_eq!(
        next_item(&mut s.events).await,
        CallEvent::RemoteStream {
            remote: s.remote.clone(),
            stream
        }
    );
}

#[tokio::test]
async fn test_close_tears_down_once() {
    init_tracing();
    let engine = MockEngine::new();
    let mut s = start_session(&engine, Role::Initiator, false, TIMEOUT).await;
    s.handle.send(NegotiationEvent::CreateOffer);
    next_item(&mut s.sent).await;

    s.handle.send(NegotiationEvent::Close);
    s.handle.send(NegotiationEvent::Close);

    let remote = s.remote.clone();
    wait_for(&mut s.events, |e| (e == CallEvent::Closed { remote: remote.clone() }).then_some(())).await;
    let closes = engine
        .calls()
        .into_iter()
        .filter(|c| *c == MockCall::Close)
        .count();
    assert_eq!(closes, 1);
}
