use parley_core::{ClientSignal, ConnId, ServerSignal};
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestRouter;

async fn two_in_room(router: &TestRouter) -> (ConnId, ConnId, ConnId) {
    let a = router.connect("a").await;
    let b = router.connect("b").await;
    let c = router.connect("c").await;
    router.join(&a, "room1").await;
    router.join(&b, "room1").await;
    router.join(&c, "room1").await;
    router.reset().await;
    (a, b, c)
}

#[tokio::test]
async fn test_offer_reaches_only_target() {
    init_tracing();
    let router = TestRouter::spawn();
    let (a, b, c) = two_in_room(&router).await;
    let sdp = json!({"type": "offer", "sdp": "X"});

    router.offer(&a, &b, sdp.clone()).await;

    assert_eq!(
        router.received(&b).await,
        vec![ServerSignal::Offer {
            caller: a.clone(),
            sdp
        }]
    );
    assert!(router.output.signals_for(&a).await.is_empty());
    assert!(router.output.signals_for(&c).await.is_empty());
}

#[tokio::test]
async fn test_answer_goes_back_to_caller() {
    init_tracing();
    let router = TestRouter::spawn();
    let (a, b, c) = two_in_room(&router).await;
    let sdp = json!({"type": "answer", "sdp": "Y"});

    router
        .send(
            &b,
            ClientSignal::Answer {
                caller: a.clone(),
                sdp: sdp.clone(),
            },
        )
        .await;

    assert_eq!(
        router.received(&a).await,
        vec![ServerSignal::Answer {
            answerer: b.clone(),
            sdp
        }]
    );
    assert!(router.output.signals_for(&c).await.is_empty());
}

#[tokio::test]
async fn test_spoofed_caller_is_replaced_by_sender() {
    init_tracing();
    let router = TestRouter::spawn();
    let (a, b, c) = two_in_room(&router).await;

    router
        .send(
            &a,
            ClientSignal::Offer {
                target: b.clone(),
                caller: c.clone(),
                sdp: json!({}),
            },
        )
        .await;

    assert_eq!(
        router.received(&b).await,
        vec![ServerSignal::Offer {
            caller: a.clone(),
            sdp: json!({})
        }]
    );
}

#[tokio::test]
async fn test_offer_does_not_require_shared_room() {
    init_tracing();
    let router = TestRouter::spawn();
    let a = router.connect("a").await;
    let b = router.connect("b").await;

    router.offer(&a, &b, json!("opaque")).await;

    assert_eq!(
        router.received(&b).await,
        vec![ServerSignal::Offer {
            caller: a,
            sdp: json!("opaque")
        }]
    );
}
