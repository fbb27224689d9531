use chrono::Utc;
use uuid::Uuid;

use whatsport_core::types::{Actor, GroupRole, NotificationKind, Role, User};
use whatsport_core::{AppContext, CoreError};
use whatsport_outbox::OutboxDispatcher;
use whatsport_social::{CreateGroup, GroupService};

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

fn named(name: &str) -> CreateGroup {
    CreateGroup {
        name: name.to_string(),
        description: String::new(),
        is_private: false,
    }
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
async fn create_seeds_the_creator_as_sole_admin() {
    let ctx = AppContext::in_memory();
    let ana = add_player(&ctx, "ana").await;
    let service = GroupService::new(ctx.clone());

    let group = service.create(&ana, named("Sunday league")).await.unwrap();
    assert_eq!(group.members.len(), 1);
    assert_eq!(group.members[0].user_id, ana.user_id);
    assert_eq!(group.members[0].role, GroupRole::Admin);
}

#[tokio::test]
async fn invite_is_admin_only_and_guards_duplicates() {
    let ctx = AppContext::in_memory();
    let ana = add_player(&ctx, "ana").await;
    let beto = add_player(&ctx, "beto").await;
    let caio = add_player(&ctx, "caio").await;
    let service = GroupService::new(ctx.clone());

    let group = service.create(&ana, named("Sunday league")).await.unwrap();
    let group = service.invite(&ana, group.id, beto.user_id).await.unwrap();
    assert_eq!(group.members.len(), 2);
    assert_eq!(group.member(beto.user_id).unwrap().role, GroupRole::Member);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &beto)
        .await
        .contains(&NotificationKind::GroupInvitation));

    // A plain member cannot invite.
    let err = service.invite(&beto, group.id, caio.user_id).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let err = service.invite(&ana, group.id, beto.user_id).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyMember));
}

#[tokio::test]
async fn change_role_promotes_and_keeps_one_admin() {
    let ctx = AppContext::in_memory();
    let ana = add_player(&ctx, "ana").await;
    let beto = add_player(&ctx, "beto").await;
    let service = GroupService::new(ctx.clone());

    let group = service.create(&ana, named("Sunday league")).await.unwrap();
    service.invite(&ana, group.id, beto.user_id).await.unwrap();

    // The sole admin cannot demote themselves.
    let err = service
        .change_role(&ana, group.id, ana.user_id, GroupRole::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let group = service
        .change_role(&ana, group.id, beto.user_id, GroupRole::Admin)
        .await
        .unwrap();
    assert_eq!(group.member(beto.user_id).unwrap().role, GroupRole::Admin);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &beto)
        .await
        .contains(&NotificationKind::GroupRoleChanged));

    // With a second admin in place, the demotion goes through.
    let group = service
        .change_role(&beto, group.id, ana.user_id, GroupRole::Member)
        .await
        .unwrap();
    assert_eq!(group.member(ana.user_id).unwrap().role, GroupRole::Member);
}

#[tokio::test]
async fn remove_member_is_admin_only_and_notifies() {
    let ctx = AppContext::in_memory();
    let ana = add_player(&ctx, "ana").await;
    let beto = add_player(&ctx, "beto").await;
    let caio = add_player(&ctx, "caio").await;
    let service = GroupService::new(ctx.clone());

    let group = service.create(&ana, named("Sunday league")).await.unwrap();
    service.invite(&ana, group.id, beto.user_id).await.unwrap();
    service.invite(&ana, group.id, caio.user_id).await.unwrap();

    let err = service
        .remove_member(&beto, group.id, caio.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let group = service
        .remove_member(&ana, group.id, caio.user_id)
        .await
        .unwrap();
    assert!(group.member(caio.user_id).is_none());

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &caio)
        .await
        .contains(&NotificationKind::GroupMemberRemoved));
}

#[tokio::test]
async fn sole_admin_leaving_promotes_the_earliest_member() {
    let ctx = AppContext::in_memory();
    let ana = add_player(&ctx, "ana").await;
    let beto = add_player(&ctx, "beto").await;
    let caio = add_player(&ctx, "caio").await;
    let service = GroupService::new(ctx.clone());

    let group = service.create(&ana, named("Sunday league")).await.unwrap();
    service.invite(&ana, group.id, beto.user_id).await.unwrap();
    service.invite(&ana, group.id, caio.user_id).await.unwrap();

    let remaining = service.leave(&ana, group.id).await.unwrap().unwrap();
    assert!(remaining.member(ana.user_id).is_none());

    let admins: Vec<_> = remaining
        .members
        .iter()
        .filter(|m| m.role == GroupRole::Admin)
        .collect();
    assert_eq!(admins.len(), 1);
    // Beto joined before Caio, so he inherits the group.
    assert_eq!(admins[0].user_id, beto.user_id);
}

#[tokio::test]
async fn last_member_leaving_deletes_the_group() {
    let ctx = AppContext::in_memory();
    let ana = add_player(&ctx, "ana").await;
    let service = GroupService::new(ctx.clone());

    let group = service.create(&ana, named("Sunday league")).await.unwrap();
    let remaining = service.leave(&ana, group.id).await.unwrap();
    assert!(remaining.is_none());
    assert!(ctx.groups.find(group.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_notifies_every_remaining_member() {
    let ctx = AppContext::in_memory();
    let ana = add_player(&ctx, "ana").await;
    let beto = add_player(&ctx, "beto").await;
    let caio = add_player(&ctx, "caio").await;
    let service = GroupService::new(ctx.clone());

    let group = service.create(&ana, named("Sunday league")).await.unwrap();
    service.invite(&ana, group.id, beto.user_id).await.unwrap();
    service.invite(&ana, group.id, caio.user_id).await.unwrap();

    let err = service.delete(&beto, group.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    service.delete(&ana, group.id).await.unwrap();
    assert!(ctx.groups.find(group.id).await.unwrap().is_none());

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &beto).await.contains(&NotificationKind::GroupDeleted));
    assert!(kinds_for(&ctx, &caio).await.contains(&NotificationKind::GroupDeleted));
    assert!(!kinds_for(&ctx, &ana).await.contains(&NotificationKind::GroupDeleted));
}

#[tokio::test]
async fn leaving_a_group_you_are_not_in_is_not_found() {
    let ctx = AppContext::in_memory();
    let ana = add_player(&ctx, "ana").await;
    let sam = add_player(&ctx, "sam").await;
    let service = GroupService::new(ctx.clone());

    let group = service.create(&ana, named("Sunday league")).await.unwrap();
    let err = service.leave(&sam, group.id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}
