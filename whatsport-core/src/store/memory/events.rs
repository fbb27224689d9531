use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::lock;
use crate::error::CoreResult;
use crate::store::{EventFilter, EventStore};
use crate::types::{Event, EventStatus};

#[derive(Default)]
pub struct MemoryEventStore {
    rows: Mutex<HashMap<Uuid, Event>>,
}

fn visible_to(event: &Event, viewer: Uuid) -> bool {
    !event.is_private
        || event.organizer_id == viewer
        || event.participant(viewer).is_some()
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: &Event) -> CoreResult<()> {
        lock(&self.rows, "event")?.insert(event.id, event.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Event>> {
        Ok(lock(&self.rows, "event")?.get(&id).cloned())
    }

    async fn update(&self, event: &Event, expected_version: i32) -> CoreResult<bool> {
        let mut rows = lock(&self.rows, "event")?;
        match rows.get(&event.id) {
            Some(stored) if stored.version == expected_version => {
                rows.insert(event.id, event.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self, filter: &EventFilter) -> CoreResult<Vec<Event>> {
        let mut events: Vec<Event> = lock(&self.rows, "event")?
            .values()
            .filter(|e| {
                if let Some(viewer) = filter.viewer {
                    if !visible_to(e, viewer) {
                        return false;
                    }
                    if filter.participant_only && e.participant(viewer).is_none() {
                        return false;
                    }
                }
                if let Some(after) = filter.starts_after {
                    if e.start_time < after {
                        return false;
                    }
                }
                if let Some(sport) = &filter.sport_type {
                    if &e.sport_type != sport {
                        return false;
                    }
                }
                if let Some(level) = &filter.skill_level {
                    if &e.skill_level != level {
                        return false;
                    }
                }
                if let Some(status) = filter.status {
                    if e.status != status {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(events)
    }

    async fn has_window_conflict(
        &self,
        organizer_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> CoreResult<bool> {
        Ok(lock(&self.rows, "event")?.values().any(|e| {
            e.organizer_id == organizer_id
                && e.status == EventStatus::Scheduled
                && Some(e.id) != exclude
                && e.start_time < end
                && start < e.end_time
        }))
    }

    async fn count_future_for_space(
        &self,
        space_id: Uuid,
        after: DateTime<Utc>,
    ) -> CoreResult<i64> {
        Ok(lock(&self.rows, "event")?
            .values()
            .filter(|e| e.space_id == Some(space_id) && e.end_time >= after)
            .count() as i64)
    }
}
