use parley_core::{ClientSignal, ConnId, ServerSignal};
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestRouter;

#[tokio::test]
async fn test_offer_to_unknown_target_reports_failure_to_sender_only() {
    init_tracing();
    let router = TestRouter::spawn();
    let a = router.connect("a").await;
    let b = router.connect("b").await;
    router.join(&a, "room1").await;
    router.join(&b, "room1").await;
    router.reset().await;
    let nobody = ConnId::from("nobody");

    router.offer(&a, &nobody, json!({"type": "offer"})).await;

    assert_eq!(
        router.received(&a).await,
        vec![ServerSignal::DeliveryFailed {
            target: nobody,
            event: "offer".into()
        }]
    );
    assert!(router.output.signals_for(&b).await.is_empty());
}

#[tokio::test]
async fn test_answer_to_departed_caller_reports_failure() {
    init_tracing();
    let router = TestRouter::spawn();
    let a = router.connect("a").await;
    let b = router.connect("b").await;
    router.disconnect(&a).await;

    router
        .send(
            &b,
            ClientSignal::Answer {
                caller: a.clone(),
                sdp: json!({"type": "answer"}),
            },
        )
        .await;

    assert_eq!(
        router.received(&b).await,
        vec![ServerSignal::DeliveryFailed {
            target: a.clone(),
            event: "answer".into()
        }]
    );
    assert!(router.output.signals_for(&a).await.is_empty());
}

#[tokio::test]
async fn test_router_survives_bad_targets() {
    init_tracing();
    let router = TestRouter::spawn();
    let a = router.connect("a").await;
    let b = router.connect("b").await;

    for i in 0..20 {
        router
            .offer(&a, &ConnId::from(format!("ghost-{}", i)), json!({}))
            .await;
    }
    router.offer(&a, &b, json!({"ok": true})).await;

    assert_eq!(
        router.received(&b).await,
        vec![ServerSignal::Offer {
            caller: a.clone(),
            sdp: json!({"ok": true})
        }]
    );
    assert_eq!(router.output.signals_for(&a).await.len(), 20);
}
