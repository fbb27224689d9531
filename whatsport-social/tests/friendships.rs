use chrono::Utc;
use uuid::Uuid;

use whatsport_core::types::{Actor, FriendshipStatus, NotificationKind, Role, User};
use whatsport_core::{AppContext, CoreError};
use whatsport_outbox::OutboxDispatcher;
use whatsport_social::FriendshipService;

async fn add_player(ctx: &AppContext, name: &str) -> Actor {
    let id = Uuid::new_v4();
    let now = Utc::now();
    ctx.users
        .insert(&User {
            id,
            email: format!("{name}@example.com"),
            role: Role::Player,
            full_name: Some(name.to_string()),
            phone: None,
            sports: vec![],
            company_name: None,
            company_document: None,
            bank_info: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    Actor { user_id: id, role: Role::Player }
}

async fn drain(ctx: &AppContext) -> usize {
    OutboxDispatcher::new(ctx.clone()).drain_once().await.unwrap()
}

async fn kinds_for(ctx: &AppContext, user: &Actor) -> Vec<NotificationKind> {
    ctx.notifications
        .list_for_user(user.user_id, 50)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.kind)
        .collect()
}

#[tokio::test]
async fn request_and_accept_round_trip() {
    let ctx = AppContext::in_memory();
    let alice = add_player(&ctx, "alice").await;
    let bob = add_player(&ctx, "bob").await;
    let service = FriendshipService::new(ctx.clone());

    let friendship = service.send_request(&alice, bob.user_id).await.unwrap();
    assert_eq!(friendship.status, FriendshipStatus::Pending);
    assert_eq!(friendship.requested_by, alice.user_id);

    drain(&ctx).await;
    assert_eq!(kinds_for(&ctx, &bob).await, vec![NotificationKind::FriendRequest]);

    let accepted = service.respond(&bob, friendship.id, true).await.unwrap();
    assert_eq!(accepted.status, FriendshipStatus::Accepted);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &alice)
        .await
        .contains(&NotificationKind::FriendAccepted));
}

#[tokio::test]
async fn one_record_per_pair_regardless_of_direction() {
    let ctx = AppContext::in_memory();
    let alice = add_player(&ctx, "alice").await;
    let bob = add_player(&ctx, "bob").await;
    let service = FriendshipService::new(ctx.clone());

    service.send_request(&alice, bob.user_id).await.unwrap();
    let err = service.send_request(&bob, alice.user_id).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists(_)));

    // The relation reads the same from both sides.
    let ab = service.status(alice.user_id, bob.user_id).await.unwrap().unwrap();
    let ba = service.status(bob.user_id, alice.user_id).await.unwrap().unwrap();
    assert_eq!(ab.id, ba.id);
}

#[tokio::test]
async fn only_the_counterpart_may_respond() {
    let ctx = AppContext::in_memory();
    let alice = add_player(&ctx, "alice").await;
    let bob = add_player(&ctx, "bob").await;
    let carol = add_player(&ctx, "carol").await;
    let service = FriendshipService::new(ctx.clone());

    let friendship = service.send_request(&alice, bob.user_id).await.unwrap();

    let err = service.respond(&alice, friendship.id, true).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let err = service.respond(&carol, friendship.id, true).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let declined = service.respond(&bob, friendship.id, false).await.unwrap();
    assert_eq!(declined.status, FriendshipStatus::Declined);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &alice)
        .await
        .contains(&NotificationKind::FriendDeclined));

    // Declined is terminal for respond.
    let err = service.respond(&bob, friendship.id, true).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn cancel_deletes_the_pending_record() {
    let ctx = AppContext::in_memory();
    let alice = add_player(&ctx, "alice").await;
    let bob = add_player(&ctx, "bob").await;
    let service = FriendshipService::new(ctx.clone());

    let friendship = service.send_request(&alice, bob.user_id).await.unwrap();

    let err = service.cancel(&bob, friendship.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    service.cancel(&alice, friendship.id).await.unwrap();
    assert!(service
        .status(alice.user_id, bob.user_id)
        .await
        .unwrap()
        .is_none());

    // A fresh request is possible afterwards.
    service.send_request(&bob, alice.user_id).await.unwrap();
}

#[tokio::test]
async fn remove_deletes_an_accepted_friendship_and_notifies() {
    let ctx = AppContext::in_memory();
    let alice = add_player(&ctx, "alice").await;
    let bob = add_player(&ctx, "bob").await;
    let service = FriendshipService::new(ctx.clone());

    let friendship = service.send_request(&alice, bob.user_id).await.unwrap();

    // Pending cannot be removed, only canceled.
    let err = service.remove(&alice, friendship.id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));

    service.respond(&bob, friendship.id, true).await.unwrap();
    service.remove(&alice, friendship.id).await.unwrap();

    assert!(service
        .status(alice.user_id, bob.user_id)
        .await
        .unwrap()
        .is_none());

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &bob).await.contains(&NotificationKind::FriendRemoved));
}

#[tokio::test]
async fn block_is_silent_and_reachable_from_any_state() {
    let ctx = AppContext::in_memory();
    let alice = add_player(&ctx, "alice").await;
    let bob = add_player(&ctx, "bob").await;
    let service = FriendshipService::new(ctx.clone());

    // Block with no prior record.
    let blocked = service.block(&alice, bob.user_id).await.unwrap();
    assert_eq!(blocked.status, FriendshipStatus::Blocked);
    assert_eq!(blocked.blocked_by, Some(alice.user_id));

    // No fan-out at all: the blocked party never hears about it.
    assert_eq!(drain(&ctx).await, 0);
    assert!(kinds_for(&ctx, &bob).await.is_empty());

    // A blocked pair cannot start a new request.
    let err = service.send_request(&bob, alice.user_id).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists(_)));
}

#[tokio::test]
async fn block_overrides_an_accepted_friendship() {
    let ctx = AppContext::in_memory();
    let alice = add_player(&ctx, "alice").await;
    let bob = add_player(&ctx, "bob").await;
    let service = FriendshipService::new(ctx.clone());

    let friendship = service.send_request(&alice, bob.user_id).await.unwrap();
    service.respond(&bob, friendship.id, true).await.unwrap();

    let blocked = service.block(&bob, alice.user_id).await.unwrap();
    assert_eq!(blocked.id, friendship.id);
    assert_eq!(blocked.status, FriendshipStatus::Blocked);
    assert_eq!(blocked.blocked_by, Some(bob.user_id));
}

#[tokio::test]
async fn unblock_is_blocker_only_and_deletes_the_record() {
    let ctx = AppContext::in_memory();
    let alice = add_player(&ctx, "alice").await;
    let bob = add_player(&ctx, "bob").await;
    let service = FriendshipService::new(ctx.clone());

    let blocked = service.block(&alice, bob.user_id).await.unwrap();

    let err = service.unblock(&bob, blocked.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    service.unblock(&alice, blocked.id).await.unwrap();
    assert!(service
        .status(alice.user_id, bob.user_id)
        .await
        .unwrap()
        .is_none());

    // The pair can start over.
    service.send_request(&bob, alice.user_id).await.unwrap();
}

#[tokio::test]
async fn self_requests_are_rejected() {
    let ctx = AppContext::in_memory();
    let alice = add_player(&ctx, "alice").await;
    let service = FriendshipService::new(ctx.clone());

    let err = service.send_request(&alice, alice.user_id).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}
