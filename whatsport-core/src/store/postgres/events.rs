use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::error::{CoreError, CoreResult};
use crate::schema::events;
use crate::store::{EventFilter, EventStore};
use crate::types::{Event, EventStatus, Location};

pub struct PgEventStore {
    pool: Arc<DbPool>,
}

impl PgEventStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CoreResult<DbConnection> {
        Ok(self.pool.get().await?)
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = events)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    sport_type: String,
    skill_level: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    lat: f64,
    lng: f64,
    address: String,
    city: Option<String>,
    max_participants: i32,
    participants: serde_json::Value,
    organizer_id: Uuid,
    space_id: Option<Uuid>,
    space_name: Option<String>,
    price_per_person: f64,
    is_private: bool,
    status: String,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = CoreError;

    fn try_from(row: EventRow) -> CoreResult<Event> {
        Ok(Event {
            id: row.id,
            title: row.title,
            description: row.description,
            sport_type: row.sport_type,
            skill_level: row.skill_level,
            start_time: row.start_time,
            end_time: row.end_time,
            location: Location {
                lat: row.lat,
                lng: row.lng,
                address: row.address,
                city: row.city,
            },
            max_participants: row.max_participants,
            participants: serde_json::from_value(row.participants)?,
            organizer_id: row.organizer_id,
            space_id: row.space_id,
            space_name: row.space_name,
            price_per_person: row.price_per_person,
            is_private: row.is_private,
            status: row.status.parse()?,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<&Event> for EventRow {
    type Error = CoreError;

    fn try_from(event: &Event) -> CoreResult<EventRow> {
        Ok(EventRow {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            sport_type: event.sport_type.clone(),
            skill_level: event.skill_level.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            lat: event.location.lat,
            lng: event.location.lng,
            address: event.location.address.clone(),
            city: event.location.city.clone(),
            max_participants: event.max_participants,
            participants: serde_json::to_value(&event.participants)?,
            organizer_id: event.organizer_id,
            space_id: event.space_id,
            space_name: event.space_name.clone(),
            price_per_person: event.price_per_person,
            is_private: event.is_private,
            status: event.status.as_str().to_string(),
            version: event.version,
            created_at: event.created_at,
            updated_at: event.updated_at,
        })
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: &Event) -> CoreResult<()> {
        let row = EventRow::try_from(event)?;
        let mut conn = self.conn().await?;
        diesel::insert_into(events::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Event>> {
        let mut conn = self.conn().await?;
        let row: Option<EventRow> = events::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        row.map(Event::try_from).transpose()
    }

    async fn update(&self, event: &Event, expected_version: i32) -> CoreResult<bool> {
        let row = EventRow::try_from(event)?;
        let mut conn = self.conn().await?;
        let updated = diesel::update(
            events::table
                .filter(events::id.eq(event.id))
                .filter(events::version.eq(expected_version)),
        )
        .set(&row)
        .execute(&mut conn)
        .await?;
        Ok(updated > 0)
    }

    async fn list(&self, filter: &EventFilter) -> CoreResult<Vec<Event>> {
        let mut conn = self.conn().await?;
        let mut query = events::table.into_boxed();

        if let Some(viewer) = filter.viewer {
            let participant_key = serde_json::json!([{ "user_id": viewer }]);
            if filter.participant_only {
                query = query.filter(events::participants.contains(participant_key));
            } else {
                query = query.filter(
                    events::is_private
                        .eq(false)
                        .or(events::organizer_id.eq(viewer))
                        .or(events::participants.contains(participant_key)),
                );
            }
        }
        if let Some(after) = filter.starts_after {
            query = query.filter(events::start_time.ge(after));
        }
        if let Some(sport) = &filter.sport_type {
            query = query.filter(events::sport_type.eq(sport.clone()));
        }
        if let Some(level) = &filter.skill_level {
            query = query.filter(events::skill_level.eq(level.clone()));
        }
        if let Some(status) = filter.status {
            query = query.filter(events::status.eq(status.as_str()));
        }

        let rows: Vec<EventRow> = query
            .order(events::start_time.asc())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(Event::try_from).collect()
    }

    async fn has_window_conflict(
        &self,
        organizer_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> CoreResult<bool> {
        let mut conn = self.conn().await?;
        let mut query = events::table
            .filter(events::organizer_id.eq(organizer_id))
            .filter(events::status.eq(EventStatus::Scheduled.as_str()))
            .filter(events::start_time.lt(end))
            .filter(events::end_time.gt(start))
            .into_boxed();
        if let Some(exclude) = exclude {
            query = query.filter(events::id.ne(exclude));
        }
        let found: Option<Uuid> = query
            .select(events::id)
            .first(&mut conn)
            .await
            .optional()?;
        Ok(found.is_some())
    }

    async fn count_future_for_space(
        &self,
        space_id: Uuid,
        after: DateTime<Utc>,
    ) -> CoreResult<i64> {
        let mut conn = self.conn().await?;
        let count = events::table
            .filter(events::space_id.eq(space_id))
            .filter(events::end_time.ge(after))
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(count)
    }
}
