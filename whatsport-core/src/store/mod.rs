//! Storage traits over the document collections.
//!
//! Each collection gets a narrow trait; services contain the state-machine
//! logic and call these for reads and guarded writes. Two backends exist:
//! Postgres (production) and in-memory (tests, local tooling).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::types::{
    Event, EventStatus, Friendship, FriendshipStatus, Group, NewOutboxRecord, Notification,
    OutboxRecord, Reservation, ReservationStatus, Space, User,
};

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;
    async fn update(&self, user: &User) -> CoreResult<bool>;
}

#[derive(Debug, Clone, Default)]
pub struct SpaceSearch {
    pub term: Option<String>,
    pub sport_type: Option<String>,
    pub city: Option<String>,
}

#[async_trait]
pub trait SpaceStore: Send + Sync {
    async fn insert(&self, space: &Space) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Space>>;
    async fn update(&self, space: &Space) -> CoreResult<bool>;
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;
    async fn list_by_manager(&self, manager_id: Uuid) -> CoreResult<Vec<Space>>;
    async fn search(&self, filter: &SpaceSearch) -> CoreResult<Vec<Space>>;
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Private events are only visible to their organizer and participants.
    pub viewer: Option<Uuid>,
    pub participant_only: bool,
    pub starts_after: Option<DateTime<Utc>>,
    pub sport_type: Option<String>,
    pub skill_level: Option<String>,
    pub status: Option<EventStatus>,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: &Event) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Event>>;
    /// Writes the whole record guarded by `expected_version`; the stored
    /// version becomes `event.version`. Returns false when the guard misses.
    async fn update(&self, event: &Event, expected_version: i32) -> CoreResult<bool>;
    async fn list(&self, filter: &EventFilter) -> CoreResult<Vec<Event>>;
    /// True when the organizer already has a scheduled event overlapping
    /// the window, excluding `exclude` when given.
    async fn has_window_conflict(
        &self,
        organizer_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> CoreResult<bool>;
    async fn count_future_for_space(&self, space_id: Uuid, after: DateTime<Utc>) -> CoreResult<i64>;
}

#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub starts_after: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn insert(&self, reservation: &Reservation) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Reservation>>;
    /// Compare-and-swap on the status column. Returns false when the stored
    /// status no longer matches `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        new: ReservationStatus,
        rejection_reason: Option<String>,
    ) -> CoreResult<bool>;
    async fn list_by_organizer(
        &self,
        organizer_id: Uuid,
        filter: &ReservationFilter,
    ) -> CoreResult<Vec<Reservation>>;
    async fn list_by_space(
        &self,
        space_id: Uuid,
        filter: &ReservationFilter,
    ) -> CoreResult<Vec<Reservation>>;
    async fn list_by_spaces(&self, space_ids: &[Uuid]) -> CoreResult<Vec<Reservation>>;
    /// True when a pending or approved reservation on the space overlaps
    /// the window.
    async fn has_overlap(
        &self,
        space_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<bool>;
    async fn count_future_for_space(&self, space_id: Uuid, after: DateTime<Utc>) -> CoreResult<i64>;
}

#[async_trait]
pub trait FriendshipStore: Send + Sync {
    async fn insert(&self, friendship: &Friendship) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Friendship>>;
    /// Lookup by canonical pair key (`user_lo`, `user_hi`).
    async fn find_pair(&self, user_lo: Uuid, user_hi: Uuid) -> CoreResult<Option<Friendship>>;
    /// Compare-and-swap on the status column.
    async fn update_status(
        &self,
        id: Uuid,
        expected: FriendshipStatus,
        new: FriendshipStatus,
    ) -> CoreResult<bool>;
    /// Unconditional move to `blocked`; valid from any prior state.
    async fn set_blocked(&self, id: Uuid, blocked_by: Uuid) -> CoreResult<bool>;
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;
    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<FriendshipStatus>,
    ) -> CoreResult<Vec<Friendship>>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn insert(&self, group: &Group) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Group>>;
    /// Same guarded-write contract as `EventStore::update`.
    async fn update(&self, group: &Group, expected_version: i32) -> CoreResult<bool>;
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;
    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Group>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &Notification) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Notification>>;
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> CoreResult<Vec<Notification>>;
    /// Idempotent; returns true when the record flipped to read.
    async fn mark_read(&self, id: Uuid) -> CoreResult<bool>;
    async fn mark_many_read(&self, user_id: Uuid, ids: &[Uuid]) -> CoreResult<usize>;
    /// `(total, unread)` for the user.
    async fn counts(&self, user_id: Uuid) -> CoreResult<(i64, i64)>;
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn append(&self, record: NewOutboxRecord) -> CoreResult<()>;
    /// Undispatched records below the retry ceiling, oldest first.
    async fn due(&self, max_retries: i32, limit: i64) -> CoreResult<Vec<OutboxRecord>>;
    async fn mark_dispatched(&self, id: i64) -> CoreResult<()>;
    async fn mark_failed(&self, id: i64, error: &str) -> CoreResult<()>;
}
