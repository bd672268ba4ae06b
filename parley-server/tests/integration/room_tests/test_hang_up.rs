use parley_core::{ClientSignal, RoomId, ServerSignal};

use crate::integration::init_tracing;
use crate::utils::TestRouter;

#[tokio::test]
async fn test_hang_up_reaches_room_members_only() {
    init_tracing();
    let router = TestRouter::spawn();
    let a = router.connect("a").await;
    let b = router.connect("b").await;
    let outsider = router.connect("outsider").await;
    router.join(&a, "room1").await;
    router.join(&b, "room1").await;
    router.join(&outsider, "room2").await;
    router.reset().await;

    router
        .send(
            &a,
            ClientSignal::HangUp {
                room_id: RoomId::from("room1"),
            },
        )
        .await;

    assert_eq!(
        router.received(&b).await,
        vec![ServerSignal::UserHungUp { conn_id: a.clone() }]
    );
    assert!(router.output.signals_for(&a).await.is_empty());
    assert!(router.output.signals_for(&outsider).await.is_empty());
}

#[tokio::test]
async fn test_hang_up_for_foreign_room_is_dropped() {
    init_tracing();
    let router = TestRouter::spawn();
    let a = router.connect("a").await;
    let b = router.connect("b").await;
    router.join(&a, "room1").await;
    router.join(&b, "room2").await;
    router.reset().await;

    router
        .send(
            &a,
            ClientSignal::HangUp {
                room_id: RoomId::from("room2"),
            },
        )
        .await;

    router.sync().await;
    assert!(router.output.all().await.is_empty());
}

#[tokio::test]
async fn test_hang_up_keeps_membership() {
    init_tracing();
    let router = TestRouter::spawn();
    let a = router.connect("a").await;
    let b = router.connect("b").await;
    router.join(&a, "room1").await;
    router.join(&b, "room1").await;

    router
        .send(
            &a,
            ClientSignal::HangUp {
                room_id: RoomId::from("room1"),
            },
        )
        .await;
    router.reset().await;
    router.disconnect(&a).await;

    assert_eq!(
        router.received(&b).await,
        vec![ServerSignal::UserLeft { conn_id: a }]
    );
}
