use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::lock;
use crate::error::CoreResult;
use crate::store::{ReservationFilter, ReservationStore};
use crate::types::{Reservation, ReservationStatus};

#[derive(Default)]
pub struct MemoryReservationStore {
    rows: Mutex<HashMap<Uuid, Reservation>>,
}

fn matches(reservation: &Reservation, filter: &ReservationFilter) -> bool {
    if let Some(status) = filter.status {
        if reservation.status != status {
            return false;
        }
    }
    if let Some(after) = filter.starts_after {
        if reservation.start_time < after {
            return false;
        }
    }
    true
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn insert(&self, reservation: &Reservation) -> CoreResult<()> {
        lock(&self.rows, "reservation")?.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Reservation>> {
        Ok(lock(&self.rows, "reservation")?.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        new: ReservationStatus,
        rejection_reason: Option<String>,
    ) -> CoreResult<bool> {
        let mut rows = lock(&self.rows, "reservation")?;
        match rows.get_mut(&id) {
            Some(stored) if stored.status == expected => {
                stored.status = new;
                if rejection_reason.is_some() {
                    stored.rejection_reason = rejection_reason;
                }
                stored.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_organizer(
        &self,
        organizer_id: Uuid,
        filter: &ReservationFilter,
    ) -> CoreResult<Vec<Reservation>> {
        let mut out: Vec<Reservation> = lock(&self.rows, "reservation")?
            .values()
            .filter(|r| r.organizer_id == organizer_id && matches(r, filter))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(out)
    }

    async fn list_by_space(
        &self,
        space_id: Uuid,
        filter: &ReservationFilter,
    ) -> CoreResult<Vec<Reservation>> {
        let mut out: Vec<Reservation> = lock(&self.rows, "reservation")?
            .values()
            .filter(|r| r.space_id == space_id && matches(r, filter))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(out)
    }

    async fn list_by_spaces(&self, space_ids: &[Uuid]) -> CoreResult<Vec<Reservation>> {
        let mut out: Vec<Reservation> = lock(&self.rows, "reservation")?
            .values()
            .filter(|r| space_ids.contains(&r.space_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(out)
    }

    async fn has_overlap(
        &self,
        space_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CoreResult<bool> {
        Ok(lock(&self.rows, "reservation")?.values().any(|r| {
            r.space_id == space_id
                && matches!(
                    r.status,
                    ReservationStatus::Pending | ReservationStatus::Approved
                )
                && r.start_time < end
                && start < r.end_time
        }))
    }

    async fn count_future_for_space(
        &self,
        space_id: Uuid,
        after: DateTime<Utc>,
    ) -> CoreResult<i64> {
        Ok(lock(&self.rows, "reservation")?
            .values()
            .filter(|r| r.space_id == space_id && r.end_time >= after)
            .count() as i64)
    }
}
