use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use whatsport_core::types::{Actor, EventStatus, Location, NotificationKind, Role, User};
use whatsport_core::{AppContext, CoreError};
use whatsport_events::{CreateEvent, EventService, ListEvents, UpdateEvent};
use whatsport_outbox::OutboxDispatcher;

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

fn at(lat: f64, lng: f64) -> Location {
    Location {
        lat,
        lng,
        address: "somewhere".to_string(),
        city: None,
    }
}

fn pickup_game(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    max_participants: i32,
    location: Location,
) -> CreateEvent {
    CreateEvent {
        title: "Evening futsal".to_string(),
        description: "Casual game".to_string(),
        sport_type: "futsal".to_string(),
        skill_level: "intermediate".to_string(),
        start_time: start,
        end_time: end,
        location,
        max_participants,
        space_id: None,
        price_per_person: 0.0,
        is_private: false,
    }
}

fn future_window(day: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.with_ymd_and_hms(2030, 6, day, 19, 0, 0).unwrap();
    (start, start + chrono::Duration::hours(2))
}

fn past_window() -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.with_ymd_and_hms(2020, 6, 1, 19, 0, 0).unwrap();
    (start, start + chrono::Duration::hours(2))
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
async fn create_seeds_the_organizer_as_confirmed_participant() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = future_window(3);
    let event = service
        .create(&organizer, pickup_game(start, end, 10, at(0.0, 0.0)))
        .await
        .unwrap();

    assert_eq!(event.status, EventStatus::Scheduled);
    assert_eq!(event.participants.len(), 1);
    assert_eq!(event.participants[0].user_id, organizer.user_id);
    assert!(event.participants[0].confirmed);
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let service = EventService::new(ctx.clone());
    let (start, end) = future_window(3);

    let err = service
        .create(&organizer, pickup_game(start, end, 1, at(0.0, 0.0)))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = service
        .create(&organizer, pickup_game(end, start, 10, at(0.0, 0.0)))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let mut req = pickup_game(start, end, 10, at(0.0, 0.0));
    req.price_per_person = -5.0;
    let err = service.create(&organizer, req).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn organizer_window_conflicts_are_refused() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = future_window(3);
    service
        .create(&organizer, pickup_game(start, end, 10, at(0.0, 0.0)))
        .await
        .unwrap();

    let overlapping = start + chrono::Duration::hours(1);
    let err = service
        .create(
            &organizer,
            pickup_game(overlapping, overlapping + chrono::Duration::hours(2), 10, at(0.0, 0.0)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn join_enforces_capacity_against_the_stored_roster() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let anna = add_player(&ctx, "anna").await;
    let bruno = add_player(&ctx, "bruno").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = future_window(3);
    let event = service
        .create(&organizer, pickup_game(start, end, 2, at(0.0, 0.0)))
        .await
        .unwrap();

    let joined = service.join(&anna, event.id).await.unwrap();
    assert_eq!(joined.participants.len(), 2);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &organizer)
        .await
        .contains(&NotificationKind::EventNewParticipant));

    let err = service.join(&bruno, event.id).await.unwrap_err();
    assert!(matches!(err, CoreError::CapacityExceeded));
    let stored = ctx.events.find(event.id).await.unwrap().unwrap();
    assert_eq!(stored.participants.len(), 2);
}

#[tokio::test]
async fn joining_twice_is_rejected_without_growing_the_roster() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let anna = add_player(&ctx, "anna").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = future_window(3);
    let event = service
        .create(&organizer, pickup_game(start, end, 10, at(0.0, 0.0)))
        .await
        .unwrap();

    service.join(&anna, event.id).await.unwrap();
    let err = service.join(&anna, event.id).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyParticipant));

    let stored = ctx.events.find(event.id).await.unwrap().unwrap();
    assert_eq!(stored.participants.len(), 2);
}

#[tokio::test]
async fn a_started_event_cannot_be_joined() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let anna = add_player(&ctx, "anna").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = past_window();
    let event = service
        .create(&organizer, pickup_game(start, end, 10, at(0.0, 0.0)))
        .await
        .unwrap();

    let err = service.join(&anna, event.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn leave_notifies_the_organizer_and_blocks_the_organizer() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let anna = add_player(&ctx, "anna").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = future_window(3);
    let event = service
        .create(&organizer, pickup_game(start, end, 10, at(0.0, 0.0)))
        .await
        .unwrap();

    service.join(&anna, event.id).await.unwrap();
    let after_leave = service.leave(&anna, event.id).await.unwrap();
    assert_eq!(after_leave.participants.len(), 1);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &organizer)
        .await
        .contains(&NotificationKind::EventParticipantLeft));

    let err = service.leave(&organizer, event.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn cancel_fans_out_to_every_other_participant() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let anna = add_player(&ctx, "anna").await;
    let bruno = add_player(&ctx, "bruno").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = future_window(3);
    let event = service
        .create(&organizer, pickup_game(start, end, 10, at(0.0, 0.0)))
        .await
        .unwrap();
    service.join(&anna, event.id).await.unwrap();
    service.join(&bruno, event.id).await.unwrap();

    let canceled = service.cancel(&organizer, event.id).await.unwrap();
    assert_eq!(canceled.status, EventStatus::Canceled);

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &anna).await.contains(&NotificationKind::EventCanceled));
    assert!(kinds_for(&ctx, &bruno).await.contains(&NotificationKind::EventCanceled));
    assert!(!kinds_for(&ctx, &organizer)
        .await
        .contains(&NotificationKind::EventCanceled));

    let err = service.join(&anna, event.id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));
}

#[tokio::test]
async fn update_is_organizer_only_and_notifies_participants() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let anna = add_player(&ctx, "anna").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = future_window(3);
    let event = service
        .create(&organizer, pickup_game(start, end, 10, at(0.0, 0.0)))
        .await
        .unwrap();
    service.join(&anna, event.id).await.unwrap();

    let err = service
        .update(&anna, event.id, UpdateEvent { title: Some("hijack".to_string()), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let updated = service
        .update(
            &organizer,
            event.id,
            UpdateEvent { title: Some("Late game".to_string()), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Late game");

    drain(&ctx).await;
    assert!(kinds_for(&ctx, &anna).await.contains(&NotificationKind::EventUpdated));
}

#[tokio::test]
async fn complete_requires_a_finished_window() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = future_window(3);
    let future = service
        .create(&organizer, pickup_game(start, end, 10, at(0.0, 0.0)))
        .await
        .unwrap();
    let err = service.complete(&organizer, future.id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition(_)));

    let (start, end) = past_window();
    let past = service
        .create(&organizer, pickup_game(start, end, 10, at(0.0, 0.0)))
        .await
        .unwrap();
    let completed = service.complete(&organizer, past.id).await.unwrap();
    assert_eq!(completed.status, EventStatus::Completed);
}

#[tokio::test]
async fn nearby_filters_sorts_and_skips_unresolvable_coordinates() {
    let ctx = AppContext::in_memory();
    let viewer = add_player(&ctx, "vera").await;
    let a = add_player(&ctx, "anna").await;
    let b = add_player(&ctx, "bruno").await;
    let c = add_player(&ctx, "caio").await;
    let d = add_player(&ctx, "duda").await;
    let service = EventService::new(ctx.clone());

    // ~0.045 deg latitude is roughly 5 km.
    let (start, end) = future_window(3);
    let near = service
        .create(&a, pickup_game(start, end, 10, at(0.045, 0.0)))
        .await
        .unwrap();
    let nearer = service
        .create(&b, pickup_game(start, end, 10, at(0.009, 0.0)))
        .await
        .unwrap();
    // ~50 km away, outside the radius.
    service
        .create(&c, pickup_game(start, end, 10, at(0.45, 0.0)))
        .await
        .unwrap();
    // Unresolvable coordinates are skipped, not errored.
    service
        .create(&d, pickup_game(start, end, 10, at(f64::NAN, 0.0)))
        .await
        .unwrap();

    let nearby = service.nearby(&viewer, 0.0, 0.0, 10.0).await.unwrap();
    let ids: Vec<Uuid> = nearby.iter().map(|n| n.event.id).collect();
    assert_eq!(ids, vec![nearer.id, near.id]);
    assert!(nearby[0].distance_km <= nearby[1].distance_km);
}

#[tokio::test]
async fn private_events_are_hidden_from_strangers() {
    let ctx = AppContext::in_memory();
    let organizer = add_player(&ctx, "olga").await;
    let stranger = add_player(&ctx, "sam").await;
    let service = EventService::new(ctx.clone());

    let (start, end) = future_window(3);
    let mut req = pickup_game(start, end, 10, at(0.0, 0.0));
    req.is_private = true;
    let event = service.create(&organizer, req).await.unwrap();

    let err = service.get(&stranger, event.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let listed = service
        .list(&stranger, &ListEvents::default())
        .await
        .unwrap();
    assert!(listed.iter().all(|e| e.id != event.id));

    let visible = service
        .list(&organizer, &ListEvents::default())
        .await
        .unwrap();
    assert!(visible.iter().any(|e| e.id == event.id));
}
