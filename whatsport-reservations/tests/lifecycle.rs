use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use whatsport_core::types::{
    Actor, Location, NotificationKind, OpeningHours, PlayerSport, ReservationStatus, Role,
    SpaceStatus, SportOffering, User,
};
use whatsport_core::{AppContext, CoreError};
use whatsport_outbox::OutboxDispatcher;
use whatsport_reservations::{CreateReservation, CreateSpace, ReservationService, SpaceService};

async fn add_user(ctx: &AppContext, role: Role, name: &str) -> Actor {
    let id = Uuid::new_v4();
    let now = Utc::now();
    ctx.users
        .insert(&User {
            id,
            email: format!("{name}@example.com"),
            role,
            full_name: Some(name.to_string()),
            phone: None,
            sports: vec![PlayerSport {
                sport_type: "futsal".to_string(),
                skill_level: "intermediate".to_string(),
            }],
            company_name: None,
            company_document: None,
            bank_info: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    Actor { user_id: id, role }
}

fn all_week_hours() -> BTreeMap<String, OpeningHours> {
    (0..7)
        .map(|day| {
            (
                day.to_string(),
                OpeningHours {
                    opens_at: "08:00".to_string(),
                    closes_at: "22:00".to_string(),
                },
            )
        })
        .collect()
}

async fn add_space(ctx: &AppContext, manager: &Actor) -> whatsport_core::types::Space {
    SpaceService::new(ctx.clone())
        .create(
            manager,
            CreateSpace {
                name: "Arena Central".to_string(),
                description: "Indoor futsal court".to_string(),
                location: Location {
                    lat: -23.55,
                    lng: -46.63,
                    address: "Rua A, 123".to_string(),
                    city: Some("Sao Paulo".to_string()),
                },
                available_sports: vec![SportOffering {
                    sport_type: "futsal".to_string(),
                    price_per_hour: 100.0,
                    max_participants: Some(10),
                    description: None,
                }],
                amenities: vec![],
                opening_hours: all_week_hours(),
            },
        )
        .await
        .unwrap()
}

fn window(year: i32, day: u32, hour: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.with_ymd_and_hms(year, 6, day, hour, 0, 0).unwrap();
    (start, start + chrono::Duration::hours(1))
}

fn booking(space_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateReservation {
    CreateReservation {
        space_id,
        event_id: None,
        sport_type: "futsal".to_string(),
        start_time: start,
        end_time: end,
        participants_count: 4,
        notes: None,
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
async fn create_is_pending_and_notifies_manager() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let space = add_space(&ctx, &manager).await;
    let service = ReservationService::new(ctx.clone());

    let (start, end) = window(2030, 3, 10);
    let reservation = service
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap();

    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(reservation.space_name, "Arena Central");
    // 100/h * 1h * 4 participants
    assert!((reservation.total_price - 400.0).abs() < 1e-9);

    drain(&ctx).await;
    assert_eq!(
        kinds_for(&ctx, &manager).await,
        vec![NotificationKind::ReservationRequest]
    );
}

#[tokio::test]
async fn approve_notifies_organizer_and_is_single_shot() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let space = add_space(&ctx, &manager).await;
    let service = ReservationService::new(ctx.clone());

    let (start, end) = window(2030, 3, 10);
    let reservation = service
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap();

    let approved = service.approve(&manager, reservation.id).await.unwrap();
    assert_eq!(approved.status, ReservationStatus::Approved);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &player)
        .await
        .contains(&NotificationKind::ReservationApproved));

    // Approving again must fail and leave the record untouched.
    let err = service.approve(&manager, reservation.id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));
    let stored = ctx.reservations.find(reservation.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Approved);
}

#[tokio::test]
async fn approve_requires_the_owning_manager() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let stranger = add_user(&ctx, Role::Manager, "milo").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let space = add_space(&ctx, &manager).await;
    let service = ReservationService::new(ctx.clone());

    let (start, end) = window(2030, 3, 10);
    let reservation = service
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap();

    let err = service.approve(&stranger, reservation.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));
    let stored = ctx.reservations.find(reservation.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Pending);
}

#[tokio::test]
async fn reject_stores_reason_and_notifies() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let space = add_space(&ctx, &manager).await;
    let service = ReservationService::new(ctx.clone());

    let (start, end) = window(2030, 3, 10);
    let reservation = service
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap();

    let rejected = service
        .reject(&manager, reservation.id, Some("maintenance".to_string()))
        .await
        .unwrap();
    assert_eq!(rejected.status, ReservationStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("maintenance"));

    drain(&ctx).await;
    let notifications = ctx
        .notifications
        .list_for_user(player.user_id, 50)
        .await
        .unwrap();
    let rejection = notifications
        .iter()
        .find(|n| n.kind == NotificationKind::ReservationRejected)
        .unwrap();
    assert!(rejection.message.contains("maintenance"));

    let err = service.reject(&manager, reservation.id, None).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn cancel_is_organizer_only_and_pending_only() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let other = add_user(&ctx, Role::Player, "pedro").await;
    let space = add_space(&ctx, &manager).await;
    let service = ReservationService::new(ctx.clone());

    let (start, end) = window(2030, 3, 10);
    let reservation = service
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap();

    let err = service.cancel(&other, reservation.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let canceled = service.cancel(&player, reservation.id).await.unwrap();
    assert_eq!(canceled.status, ReservationStatus::Canceled);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &manager)
        .await
        .contains(&NotificationKind::ReservationCanceled));

    // An approved reservation is out of the organizer's reach.
    let (start2, end2) = window(2030, 4, 10);
    let second = service
        .create(&player, booking(space.id, start2, end2))
        .await
        .unwrap();
    service.approve(&manager, second.id).await.unwrap();
    let err = service.cancel(&player, second.id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn complete_requires_approved_and_a_finished_window() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let space = add_space(&ctx, &manager).await;
    let service = ReservationService::new(ctx.clone());

    let (past_start, past_end) = window(2020, 1, 10);
    let reservation = service
        .create(&player, booking(space.id, past_start, past_end))
        .await
        .unwrap();

    // pending -> completed is not a legal move
    let err = service.complete(&manager, reservation.id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));

    service.approve(&manager, reservation.id).await.unwrap();
    let completed = service.complete(&manager, reservation.id).await.unwrap();
    assert_eq!(completed.status, ReservationStatus::Completed);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &player)
        .await
        .contains(&NotificationKind::ReservationCompleted));

    // A window still in the future cannot be completed.
    let (start, end) = window(2030, 3, 10);
    let future = service
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap();
    service.approve(&manager, future.id).await.unwrap();
    let err = service.complete(&manager, future.id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let space = add_space(&ctx, &manager).await;
    let service = ReservationService::new(ctx.clone());

    let (start, end) = window(2030, 3, 10);

    // end before start
    let mut req = booking(space.id, end, start);
    let err = service.create(&player, req.clone()).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // sport not offered at the space
    req = booking(space.id, start, end);
    req.sport_type = "tennis".to_string();
    let err = service.create(&player, req).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // outside opening hours (space opens at 08:00)
    let early_start = Utc.with_ymd_and_hms(2030, 6, 3, 6, 0, 0).unwrap();
    let err = service
        .create(
            &player,
            booking(space.id, early_start, early_start + chrono::Duration::hours(1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // zero participants
    let mut req = booking(space.id, start, end);
    req.participants_count = 0;
    let err = service.create(&player, req).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // unknown space
    let err = service
        .create(&player, booking(Uuid::new_v4(), start, end))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound("space")));
}

#[tokio::test]
async fn overlapping_reservations_are_refused() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let other = add_user(&ctx, Role::Player, "pedro").await;
    let space = add_space(&ctx, &manager).await;
    let service = ReservationService::new(ctx.clone());

    let (start, end) = window(2030, 3, 10);
    service
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap();

    // Half-overlapping window on the same space.
    let overlap_start = start + chrono::Duration::minutes(30);
    let err = service
        .create(
            &other,
            booking(space.id, overlap_start, overlap_start + chrono::Duration::hours(1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // Back-to-back is fine.
    service
        .create(&other, booking(space.id, end, end + chrono::Duration::hours(1)))
        .await
        .unwrap();
}

#[tokio::test]
async fn upcoming_filter_and_dashboard_aggregation() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let space = add_space(&ctx, &manager).await;
    let service = ReservationService::new(ctx.clone());

    let (past_start, past_end) = window(2020, 1, 10);
    let past = service
        .create(&player, booking(space.id, past_start, past_end))
        .await
        .unwrap();
    let (start, end) = window(2030, 3, 10);
    let future = service
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap();

    let upcoming = service.list_mine(&player, None, true).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].id, future.id);

    let pending_only = service
        .list_mine(&player, Some(ReservationStatus::Pending), false)
        .await
        .unwrap();
    assert_eq!(pending_only.len(), 2);

    service.approve(&manager, future.id).await.unwrap();
    service.approve(&manager, past.id).await.unwrap();
    service.complete(&manager, past.id).await.unwrap();

    let dashboard = service.dashboard(&manager).await.unwrap();
    assert_eq!(dashboard.spaces, 1);
    assert_eq!(dashboard.approved, 1);
    assert_eq!(dashboard.completed, 1);
    assert_eq!(dashboard.upcoming, 1);
    assert!((dashboard.revenue - 800.0).abs() < 1e-9);
}

#[tokio::test]
async fn space_delete_is_blocked_by_future_reservations() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let space = add_space(&ctx, &manager).await;
    let reservations = ReservationService::new(ctx.clone());
    let spaces = SpaceService::new(ctx.clone());

    let (start, end) = window(2030, 3, 10);
    reservations
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap();

    let err = spaces.delete(&manager, space.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn inactive_space_refuses_new_reservations() {
    let ctx = AppContext::in_memory();
    let manager = add_user(&ctx, Role::Manager, "mia").await;
    let player = add_user(&ctx, Role::Player, "paulo").await;
    let space = add_space(&ctx, &manager).await;
    let spaces = SpaceService::new(ctx.clone());
    let service = ReservationService::new(ctx.clone());

    spaces
        .set_status(&manager, space.id, SpaceStatus::Inactive)
        .await
        .unwrap();

    let (start, end) = window(2030, 3, 10);
    let err = service
        .create(&player, booking(space.id, start, end))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}
