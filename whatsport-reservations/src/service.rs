use chrono::{DateTime, Datelike, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use whatsport_core::error::{CoreError, CoreResult};
use whatsport_core::store::ReservationFilter;
use whatsport_core::types::{Actor, Reservation, ReservationStatus, Space};
use whatsport_core::AppContext;
use whatsport_notify::fanout;

/// Booking lifecycle: `pending` is the only initial state; managers drive
/// `approved`/`rejected`/`completed`, organizers drive `canceled`. Every
/// transition is a compare-and-swap on the stored status.
pub struct ReservationService {
    ctx: AppContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservation {
    pub space_id: Uuid,
    pub event_id: Option<Uuid>,
    pub sport_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participants_count: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerDashboard {
    pub spaces: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub canceled: usize,
    pub completed: usize,
    pub upcoming: usize,
    /// Sum of `total_price` over approved and completed reservations.
    pub revenue: f64,
}

impl ReservationService {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, actor: &Actor, req: CreateReservation) -> CoreResult<Reservation> {
        if req.end_time <= req.start_time {
            return Err(CoreError::validation("end time must be after start time"));
        }
        if req.participants_count < 1 {
            return Err(CoreError::validation("participants count must be at least 1"));
        }

        let space = self
            .ctx
            .spaces
            .find(req.space_id)
            .await?
            .ok_or(CoreError::NotFound("space"))?;

        if space.status != whatsport_core::types::SpaceStatus::Active {
            return Err(CoreError::validation(format!(
                "space {} is not accepting reservations",
                space.name
            )));
        }

        if let Some(event_id) = req.event_id {
            let event = self
                .ctx
                .events
                .find(event_id)
                .await?
                .ok_or(CoreError::NotFound("event"))?;
            if event.organizer_id != actor.user_id {
                return Err(CoreError::unauthorized(
                    "only the event organizer can reserve a space for it",
                ));
            }
        }

        let offering = space.offering(&req.sport_type).ok_or_else(|| {
            CoreError::validation(format!(
                "{} is not available at {}",
                req.sport_type, space.name
            ))
        })?;

        check_opening_hours(&space, req.start_time, req.end_time)?;

        if self
            .ctx
            .reservations
            .has_overlap(space.id, req.start_time, req.end_time)
            .await?
        {
            return Err(CoreError::validation(
                "the space is already reserved for this time window",
            ));
        }

        let duration_hours =
            (req.end_time - req.start_time).num_seconds() as f64 / 3600.0;
        let total_price = offering.price_per_hour * duration_hours * req.participants_count as f64;

        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            space_id: space.id,
            space_name: space.name.clone(),
            event_id: req.event_id,
            organizer_id: actor.user_id,
            sport_type: req.sport_type,
            start_time: req.start_time,
            end_time: req.end_time,
            participants_count: req.participants_count,
            total_price,
            status: ReservationStatus::Pending,
            notes: req.notes,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.ctx.reservations.insert(&reservation).await?;

        let organizer_name = self.display_name(actor.user_id).await;
        fanout::enqueue(
            &self.ctx,
            fanout::reservation_request(space.manager_id, &reservation, &organizer_name),
        )
        .await;

        Ok(reservation)
    }

    pub async fn approve(&self, actor: &Actor, id: Uuid) -> CoreResult<Reservation> {
        let mut reservation = self.find(id).await?;
        self.owned_space(actor, &reservation).await?;
        require_status(&reservation, ReservationStatus::Pending, "approve")?;

        let swapped = self
            .ctx
            .reservations
            .update_status(id, ReservationStatus::Pending, ReservationStatus::Approved, None)
            .await?;
        if !swapped {
            return Err(CoreError::invalid_transition(
                "the reservation is no longer pending",
            ));
        }

        reservation.status = ReservationStatus::Approved;
        fanout::enqueue(&self.ctx, fanout::reservation_approved(&reservation)).await;

        Ok(reservation)
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        id: Uuid,
        reason: Option<String>,
    ) -> CoreResult<Reservation> {
        let mut reservation = self.find(id).await?;
        self.owned_space(actor, &reservation).await?;
        require_status(&reservation, ReservationStatus::Pending, "reject")?;

        let swapped = self
            .ctx
            .reservations
            .update_status(
                id,
                ReservationStatus::Pending,
                ReservationStatus::Rejected,
                reason.clone(),
            )
            .await?;
        if !swapped {
            return Err(CoreError::invalid_transition(
                "the reservation is no longer pending",
            ));
        }

        reservation.status = ReservationStatus::Rejected;
        reservation.rejection_reason = reason.clone();
        fanout::enqueue(
            &self.ctx,
            fanout::reservation_rejected(&reservation, reason.as_deref()),
        )
        .await;

        Ok(reservation)
    }

    pub async fn complete(&self, actor: &Actor, id: Uuid) -> CoreResult<Reservation> {
        let mut reservation = self.find(id).await?;
        self.owned_space(actor, &reservation).await?;
        require_status(&reservation, ReservationStatus::Approved, "complete")?;

        if reservation.end_time > Utc::now() {
            return Err(CoreError::invalid_transition(
                "cannot complete a reservation before its end time",
            ));
        }

        let swapped = self
            .ctx
            .reservations
            .update_status(
                id,
                ReservationStatus::Approved,
                ReservationStatus::Completed,
                None,
            )
            .await?;
        if !swapped {
            return Err(CoreError::invalid_transition(
                "the reservation is no longer approved",
            ));
        }

        reservation.status = ReservationStatus::Completed;
        fanout::enqueue(&self.ctx, fanout::reservation_completed(&reservation)).await;

        Ok(reservation)
    }

    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> CoreResult<Reservation> {
        let mut reservation = self.find(id).await?;
        if reservation.organizer_id != actor.user_id {
            return Err(CoreError::unauthorized(
                "only the organizer can cancel a reservation",
            ));
        }
        require_status(&reservation, ReservationStatus::Pending, "cancel")?;

        let swapped = self
            .ctx
            .reservations
            .update_status(id, ReservationStatus::Pending, ReservationStatus::Canceled, None)
            .await?;
        if !swapped {
            return Err(CoreError::invalid_transition(
                "the reservation is no longer pending",
            ));
        }

        reservation.status = ReservationStatus::Canceled;

        // The space may have been deleted since; skip the fan-out then.
        if let Some(space) = self.ctx.spaces.find(reservation.space_id).await? {
            let organizer_name = self.display_name(actor.user_id).await;
            fanout::enqueue(
                &self.ctx,
                fanout::reservation_canceled(space.manager_id, &reservation, &organizer_name),
            )
            .await;
        }

        Ok(reservation)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> CoreResult<Reservation> {
        let reservation = self.find(id).await?;
        if reservation.organizer_id == actor.user_id {
            return Ok(reservation);
        }
        let space = self
            .ctx
            .spaces
            .find(reservation.space_id)
            .await?
            .ok_or(CoreError::NotFound("space"))?;
        if space.manager_id != actor.user_id {
            return Err(CoreError::unauthorized("no access to this reservation"));
        }
        Ok(reservation)
    }

    pub async fn list_mine(
        &self,
        actor: &Actor,
        status: Option<ReservationStatus>,
        upcoming: bool,
    ) -> CoreResult<Vec<Reservation>> {
        let filter = ReservationFilter {
            status,
            starts_after: upcoming.then(Utc::now),
        };
        self.ctx.reservations.list_by_organizer(actor.user_id, &filter).await
    }

    pub async fn list_for_space(
        &self,
        actor: &Actor,
        space_id: Uuid,
        status: Option<ReservationStatus>,
        upcoming: bool,
    ) -> CoreResult<Vec<Reservation>> {
        let space = self
            .ctx
            .spaces
            .find(space_id)
            .await?
            .ok_or(CoreError::NotFound("space"))?;
        if space.manager_id != actor.user_id {
            return Err(CoreError::unauthorized("no access to this space"));
        }

        let filter = ReservationFilter {
            status,
            starts_after: upcoming.then(Utc::now),
        };
        self.ctx.reservations.list_by_space(space_id, &filter).await
    }

    /// Aggregates across every space owned by the manager.
    pub async fn dashboard(&self, actor: &Actor) -> CoreResult<ManagerDashboard> {
        let spaces = self.ctx.spaces.list_by_manager(actor.user_id).await?;
        let space_ids: Vec<Uuid> = spaces.iter().map(|s| s.id).collect();
        let reservations = self.ctx.reservations.list_by_spaces(&space_ids).await?;

        let now = Utc::now();
        let mut dashboard = ManagerDashboard {
            spaces: spaces.len(),
            pending: 0,
            approved: 0,
            rejected: 0,
            canceled: 0,
            completed: 0,
            upcoming: 0,
            revenue: 0.0,
        };

        for r in &reservations {
            match r.status {
                ReservationStatus::Pending => dashboard.pending += 1,
                ReservationStatus::Approved => dashboard.approved += 1,
                ReservationStatus::Rejected => dashboard.rejected += 1,
                ReservationStatus::Canceled => dashboard.canceled += 1,
                ReservationStatus::Completed => dashboard.completed += 1,
            }
            if matches!(
                r.status,
                ReservationStatus::Approved | ReservationStatus::Completed
            ) {
                dashboard.revenue += r.total_price;
            }
            if r.start_time >= now
                && matches!(
                    r.status,
                    ReservationStatus::Pending | ReservationStatus::Approved
                )
            {
                dashboard.upcoming += 1;
            }
        }

        Ok(dashboard)
    }

    async fn find(&self, id: Uuid) -> CoreResult<Reservation> {
        self.ctx
            .reservations
            .find(id)
            .await?
            .ok_or(CoreError::NotFound("reservation"))
    }

    async fn owned_space(&self, actor: &Actor, reservation: &Reservation) -> CoreResult<Space> {
        let space = self
            .ctx
            .spaces
            .find(reservation.space_id)
            .await?
            .ok_or(CoreError::NotFound("space"))?;
        if space.manager_id != actor.user_id {
            return Err(CoreError::unauthorized(
                "only the space manager can manage this reservation",
            ));
        }
        Ok(space)
    }

    async fn display_name(&self, user_id: Uuid) -> String {
        match self.ctx.users.find(user_id).await {
            Ok(Some(user)) => user.display_name(),
            _ => "A player".to_string(),
        }
    }
}

fn require_status(
    reservation: &Reservation,
    expected: ReservationStatus,
    action: &str,
) -> CoreResult<()> {
    if reservation.status != expected {
        return Err(CoreError::invalid_transition(format!(
            "cannot {} a reservation with status {}",
            action, reservation.status
        )));
    }
    Ok(())
}

/// The window must fall inside the space's opening hours for the weekday
/// of the start time (`"0"` = Monday, matching the stored keys).
fn check_opening_hours(
    space: &Space,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> CoreResult<()> {
    let day_key = start.weekday().num_days_from_monday().to_string();
    let hours = space.opening_hours.get(&day_key).ok_or_else(|| {
        CoreError::validation("the space is not open on this day of the week")
    })?;

    let opens_at = parse_hhmm(&hours.opens_at)?;
    let closes_at = parse_hhmm(&hours.closes_at)?;

    if start.time() < opens_at || end.time() > closes_at {
        return Err(CoreError::validation(format!(
            "the space is only open from {} to {} on this day",
            hours.opens_at, hours.closes_at
        )));
    }
    Ok(())
}

fn parse_hhmm(value: &str) -> CoreResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| CoreError::validation(format!("invalid opening hour {value}")))
}
