use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::error::{CoreError, CoreResult};
use crate::schema::reservations;
use crate::store::{ReservationFilter, ReservationStore};
use crate::types::{Reservation, ReservationStatus};

pub struct PgReservationStore {
    pool: Arc<DbPool>,
}

impl PgReservationStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CoreResult<DbConnection> {
        Ok(self.pool.get().await?)
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ReservationRow {
    id: Uuid,
    space_id: Uuid,
    space_name: String,
    event_id: Option<Uuid>,
    organizer_id: Uuid,
    sport_type: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    participants_count: i32,
    total_price: f64,
    status: String,
    notes: Option<String>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = CoreError;

    fn try_from(row: ReservationRow) -> CoreResult<Reservation> {
        Ok(Reservation {
            id: row.id,
            space_id: row.space_id,
            space_name: row.space_name,
            event_id: row.event_id,
            organizer_id: row.organizer_id,
            sport_type: row.sport_type,
            start_time: row.start_time,
            end_time: row.end_time,
            participants_count: row.participants_count,
            total_price: row.total_price,
            status: row.status.parse()?,
            notes: row.notes,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Reservation> for ReservationRow {
    fn from(r: &Reservation) -> ReservationRow {
        ReservationRow {
            id: r.id,
            space_id: r.space_id,
            space_name: r.space_name.clone(),
            event_id: r.event_id,
            organizer_id: r.organizer_id,
            sport_type: r.sport_type.clone(),
            start_time: r.start_time,
            end_time: r.end_time,
            participants_count: r.participants_count,
            total_price: r.total_price,
            status: r.status.as_str().to_string(),
            notes: r.notes.clone(),
            rejection_reason: r.rejection_reason.clone(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn rows_to_reservations(rows: Vec<ReservationRow>) -> CoreResult<Vec<Reservation>> {
    rows.into_iter().map(Reservation::try_from).collect()
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn insert(&self, reservation: &Reservation) -> CoreResult<()> {
        let row = ReservationRow::from(reservation);
        let mut conn = self.conn().await?;
        diesel::insert_into(reservations::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Reservation>> {
        let mut conn = self.conn().await?;
        let row: Option<ReservationRow> = reservations::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        row.map(Reservation::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        new: ReservationStatus,
        rejection_reason: Option<String>,
    ) -> CoreResult<bool> {
        let mut conn = self.conn().await?;
        let target = reservations::table
            .filter(reservations::id.eq(id))
            .filter(reservations::status.eq(expected.as_str()));

        let updated = match rejection_reason {
            Some(reason) => {
                diesel::update(target)
                    .set((
                        reservations::status.eq(new.as_str()),
                        reservations::rejection_reason.eq(reason),
                        reservations::updated_at.eq(Utc::now()),
                    ))
                    .execute(&mut conn)
                    .await?
            }
            None => {
                diesel::update(target)
                    .set((
                        reservations::status.eq(new.as_str()),
                        reservations::updated_at.eq(Utc::now()),
                    ))
                    .execute(&mut conn)
                    .await?
            }
        };
        Ok(updated > 0)
    }

    async fn list_by_organizer(
        &self,
        organizer_id: Uuid,
        filter: &ReservationFilter,
    ) -> CoreResult<Vec<Reservation>> {
        let mut conn = self.conn().await?;
        let mut query = reservations::table
            .filter(reservations::organizer_id.eq(organizer_id))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(reservations::status.eq(status.as_str()));
        }
        if let Some(after) = filter.starts_after {
            query = query.filter(reservations::start_time.ge(after));
        }
        let rows: Vec<ReservationRow> = query
            .order(reservations::start_time.asc())
            .load(&mut conn)
            .await?;
        rows_to_reservations(rows)
    }

    async fn list_by_space(
        &self,
        space_id: Uuid,
        filter: &ReservationFilter,
    ) -> CoreResult<Vec<Reservation>> {
        let mut conn = self.conn().await?;
        let mut query = reservations::table
            .filter(reservations::space_id.eq(space_id))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(reservations::status.eq(status.as_str()));
        }
        if let Some(after) = filter.starts_after {
            query = query.filter(reservations::start_time.ge(after));
        }
        let rows: Vec<ReservationRow> = query
            .order(reservations::start_time.asc())
            .load(&mut conn)
            .await?;
        rows_to_reservations(rows)
    }

    async fn list_by_spaces(&self, space_ids: &[Uuid]) -> CoreResult<Vec<Reservation>> {
        let mut conn = self.conn().await?;
        let rows: Vec<ReservationRow> = reservations::table
            .filter(reservations::space_id.eq_any(space_ids.to_vec()))
            .order(reservations::start_time.asc())
            .load(&mut conn)
            .await?;
        rows_to_reservations(rows)
    }

    async fn has_overlap(
        &self,
        space_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let mut conn = self.conn().await?;
        let blocking = vec![
            ReservationStatus::Pending.as_str(),
            ReservationStatus::Approved.as_str(),
        ];
        let found: Option<Uuid> = reservations::table
            .filter(reservations::space_id.eq(space_id))
            .filter(reservations::status.eq_any(blocking))
            .filter(reservations::start_time.lt(end))
            .filter(reservations::end_time.gt(start))
            .select(reservations::id)
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
        let count = reservations::table
            .filter(reservations::space_id.eq(space_id))
            .filter(reservations::end_time.ge(after))
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(count)
    }
}
