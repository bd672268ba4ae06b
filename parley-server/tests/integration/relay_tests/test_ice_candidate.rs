use parley_core::{ClientSignal, ServerSignal};
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestRouter;

#[tokio::test]
async fn test_candidates_keep_order() {
    init_tracing();
    let router = TestRouter::spawn();
    let a = router.connect("a").await;
    let b = router.connect("b").await;

    for i in 0..5 {
        router
            .send(
                &a,
                ClientSignal::IceCandidate {
                    target: b.clone(),
                    candidate: json!({"candidate": format!("candidate:{}", i)}),
                },
            )
            .await;
    }

    let received = router.received(&b).await;
    let expected: Vec<ServerSignal> = (0..5)
        .map(|i| ServerSignal::IceCandidate {
            from: a.clone(),
            candidate: json!({"candidate": format!("candidate:{}", i)}),
        })
        .collect();
    assert_eq!(received, expected);
}

#[tokio::test]
async fn test_late_candidate_is_dropped_silently() {
    init_tracing();
    let router = TestRouter::spawn();
    let a = router.connect("a").await;
    let b = router.connect("b").await;
    router.disconnect(&b).await;

    router
        .send(
            &a,
            ClientSignal::IceCandidate {
                target: b.clone(),
                candidate: json!({}),
            },
        )
        .await;

    router.sync().await;
    assert!(router.output.all().await.is_empty());
}
