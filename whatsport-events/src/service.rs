use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use whatsport_core::error::{CoreError, CoreResult};
use whatsport_core::geo::haversine_km;
use whatsport_core::store::EventFilter;
use whatsport_core::types::{Actor, Event, EventStatus, Location, Participant};
use whatsport_core::AppContext;
use whatsport_notify::fanout;

/// Roster writes go through a version-guarded read-decide-write loop so
/// capacity and duplicate checks always run against the latest persisted
/// roster; exhausted retries surface as `Conflict`.
const MAX_WRITE_ATTEMPTS: u32 = 3;

pub struct EventService {
    ctx: AppContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub description: String,
    pub sport_type: String,
    pub skill_level: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Location,
    pub max_participants: i32,
    pub space_id: Option<Uuid>,
    #[serde(default)]
    pub price_per_person: f64,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sport_type: Option<String>,
    pub skill_level: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub max_participants: Option<i32>,
    pub price_per_person: Option<f64>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEvents {
    pub participant_only: bool,
    pub upcoming: bool,
    pub sport_type: Option<String>,
    pub skill_level: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyEvent {
    #[serde(flatten)]
    pub event: Event,
    pub distance_km: f64,
}

impl EventService {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, actor: &Actor, req: CreateEvent) -> CoreResult<Event> {
        if req.end_time <= req.start_time {
            return Err(CoreError::validation("end time must be after start time"));
        }
        if req.max_participants < 2 {
            return Err(CoreError::validation(
                "an event needs room for at least two participants",
            ));
        }
        if req.price_per_person < 0.0 {
            return Err(CoreError::validation("price per person cannot be negative"));
        }

        if self
            .ctx
            .events
            .has_window_conflict(actor.user_id, req.start_time, req.end_time, None)
            .await?
        {
            return Err(CoreError::validation(
                "you already have an event scheduled in this time window",
            ));
        }

        let space_name = match req.space_id {
            Some(space_id) => {
                let space = self
                    .ctx
                    .spaces
                    .find(space_id)
                    .await?
                    .ok_or(CoreError::NotFound("space"))?;
                Some(space.name)
            }
            None => None,
        };

        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            sport_type: req.sport_type,
            skill_level: req.skill_level,
            start_time: req.start_time,
            end_time: req.end_time,
            location: req.location,
            max_participants: req.max_participants,
            // The organizer holds the first slot from the start.
            participants: vec![Participant {
                user_id: actor.user_id,
                confirmed: true,
                joined_at: now,
            }],
            organizer_id: actor.user_id,
            space_id: req.space_id,
            space_name,
            price_per_person: req.price_per_person,
            is_private: req.is_private,
            status: EventStatus::Scheduled,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        self.ctx.events.insert(&event).await?;
        Ok(event)
    }

    pub async fn join(&self, actor: &Actor, event_id: Uuid) -> CoreResult<Event> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let event = self.find(event_id).await?;

            if event.status != EventStatus::Scheduled {
                return Err(CoreError::invalid_transition(format!(
                    "cannot join a {} event",
                    event.status
                )));
            }
            if event.start_time <= Utc::now() {
                return Err(CoreError::validation("this event has already started"));
            }
            if event.participant(actor.user_id).is_some() {
                return Err(CoreError::AlreadyParticipant);
            }
            if event.is_full() {
                return Err(CoreError::CapacityExceeded);
            }

            let expected = event.version;
            let mut updated = event;
            updated.participants.push(Participant {
                user_id: actor.user_id,
                confirmed: true,
                joined_at: Utc::now(),
            });
            updated.version = expected + 1;
            updated.updated_at = Utc::now();

            if self.ctx.events.update(&updated, expected).await? {
                let joiner_name = self.display_name(actor.user_id).await;
                fanout::enqueue(
                    &self.ctx,
                    fanout::event_new_participant(&updated, &joiner_name),
                )
                .await;
                return Ok(updated);
            }
        }

        Err(CoreError::conflict("the event roster changed concurrently"))
    }

    pub async fn leave(&self, actor: &Actor, event_id: Uuid) -> CoreResult<Event> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let event = self.find(event_id).await?;

            if event.status != EventStatus::Scheduled {
                return Err(CoreError::invalid_transition(format!(
                    "cannot leave a {} event",
                    event.status
                )));
            }
            if event.start_time <= Utc::now() {
                return Err(CoreError::validation("this event has already started"));
            }
            if event.organizer_id == actor.user_id {
                return Err(CoreError::validation(
                    "the organizer cannot leave their own event; cancel it instead",
                ));
            }
            if event.participant(actor.user_id).is_none() {
                return Err(CoreError::validation(
                    "you are not participating in this event",
                ));
            }

            let expected = event.version;
            let mut updated = event;
            updated.participants.retain(|p| p.user_id != actor.user_id);
            updated.version = expected + 1;
            updated.updated_at = Utc::now();

            if self.ctx.events.update(&updated, expected).await? {
                let leaver_name = self.display_name(actor.user_id).await;
                fanout::enqueue(
                    &self.ctx,
                    fanout::event_participant_left(&updated, &leaver_name),
                )
                .await;
                return Ok(updated);
            }
        }

        Err(CoreError::conflict("the event roster changed concurrently"))
    }

    pub async fn update(&self, actor: &Actor, event_id: Uuid, req: UpdateEvent) -> CoreResult<Event> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let event = self.find(event_id).await?;

            if event.organizer_id != actor.user_id {
                return Err(CoreError::unauthorized(
                    "only the organizer can update the event",
                ));
            }
            if event.status != EventStatus::Scheduled {
                return Err(CoreError::invalid_transition(format!(
                    "cannot update a {} event",
                    event.status
                )));
            }

            let expected = event.version;
            let mut updated = event;

            if let Some(title) = req.title.clone() {
                updated.title = title;
            }
            if let Some(description) = req.description.clone() {
                updated.description = description;
            }
            if let Some(sport_type) = req.sport_type.clone() {
                updated.sport_type = sport_type;
            }
            if let Some(skill_level) = req.skill_level.clone() {
                updated.skill_level = skill_level;
            }
            if let Some(location) = req.location.clone() {
                updated.location = location;
            }
            if let Some(price) = req.price_per_person {
                if price < 0.0 {
                    return Err(CoreError::validation("price per person cannot be negative"));
                }
                updated.price_per_person = price;
            }
            if let Some(is_private) = req.is_private {
                updated.is_private = is_private;
            }
            if let Some(max_participants) = req.max_participants {
                if (max_participants as usize) < updated.participants.len() {
                    return Err(CoreError::validation(
                        "max participants cannot drop below the current roster size",
                    ));
                }
                if max_participants < 2 {
                    return Err(CoreError::validation(
                        "an event needs room for at least two participants",
                    ));
                }
                updated.max_participants = max_participants;
            }

            let times_changed = req.start_time.is_some() || req.end_time.is_some();
            if let Some(start) = req.start_time {
                updated.start_time = start;
            }
            if let Some(end) = req.end_time {
                updated.end_time = end;
            }
            if times_changed {
                if updated.end_time <= updated.start_time {
                    return Err(CoreError::validation("end time must be after start time"));
                }
                if self
                    .ctx
                    .events
                    .has_window_conflict(
                        actor.user_id,
                        updated.start_time,
                        updated.end_time,
                        Some(updated.id),
                    )
                    .await?
                {
                    return Err(CoreError::validation(
                        "you already have an event scheduled in this time window",
                    ));
                }
            }

            updated.version = expected + 1;
            updated.updated_at = Utc::now();

            if self.ctx.events.update(&updated, expected).await? {
                for participant in &updated.participants {
                    if participant.user_id != actor.user_id {
                        fanout::enqueue(
                            &self.ctx,
                            fanout::event_updated(participant.user_id, &updated),
                        )
                        .await;
                    }
                }
                return Ok(updated);
            }
        }

        Err(CoreError::conflict("the event changed concurrently"))
    }

    /// Replaces the source's hard delete: the event stays queryable in its
    /// terminal state and every other participant hears about it.
    pub async fn cancel(&self, actor: &Actor, event_id: Uuid) -> CoreResult<Event> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let event = self.find(event_id).await?;

            if event.organizer_id != actor.user_id {
                return Err(CoreError::unauthorized(
                    "only the organizer can cancel the event",
                ));
            }
            if event.status != EventStatus::Scheduled {
                return Err(CoreError::invalid_transition(format!(
                    "cannot cancel a {} event",
                    event.status
                )));
            }

            let expected = event.version;
            let mut updated = event;
            updated.status = EventStatus::Canceled;
            updated.version = expected + 1;
            updated.updated_at = Utc::now();

            if self.ctx.events.update(&updated, expected).await? {
                for participant in &updated.participants {
                    if participant.user_id != actor.user_id {
                        fanout::enqueue(
                            &self.ctx,
                            fanout::event_canceled(participant.user_id, &updated),
                        )
                        .await;
                    }
                }
                return Ok(updated);
            }
        }

        Err(CoreError::conflict("the event changed concurrently"))
    }

    pub async fn complete(&self, actor: &Actor, event_id: Uuid) -> CoreResult<Event> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let event = self.find(event_id).await?;

            if event.organizer_id != actor.user_id {
                return Err(CoreError::unauthorized(
                    "only the organizer can complete the event",
                ));
            }
            if event.status != EventStatus::Scheduled {
                return Err(CoreError::invalid_transition(format!(
                    "cannot complete a {} event",
                    event.status
                )));
            }
            if event.end_time > Utc::now() {
                return Err(CoreError::invalid_transition(
                    "cannot complete an event before its end time",
                ));
            }

            let expected = event.version;
            let mut updated = event;
            updated.status = EventStatus::Completed;
            updated.version = expected + 1;
            updated.updated_at = Utc::now();

            if self.ctx.events.update(&updated, expected).await? {
                return Ok(updated);
            }
        }

        Err(CoreError::conflict("the event changed concurrently"))
    }

    pub async fn get(&self, actor: &Actor, event_id: Uuid) -> CoreResult<Event> {
        let event = self.find(event_id).await?;
        if event.is_private
            && event.organizer_id != actor.user_id
            && event.participant(actor.user_id).is_none()
        {
            return Err(CoreError::unauthorized("this is a private event"));
        }
        Ok(event)
    }

    pub async fn list(&self, actor: &Actor, opts: &ListEvents) -> CoreResult<Vec<Event>> {
        let filter = EventFilter {
            viewer: Some(actor.user_id),
            participant_only: opts.participant_only,
            starts_after: opts.upcoming.then(Utc::now),
            sport_type: opts.sport_type.clone(),
            skill_level: opts.skill_level.clone(),
            status: None,
        };
        self.ctx.events.list(&filter).await
    }

    /// Upcoming scheduled events within `radius_km` of the origin, closest
    /// first. Events whose coordinates don't resolve to a finite distance
    /// are skipped, not errored.
    pub async fn nearby(
        &self,
        actor: &Actor,
        lat: f64,
        lng: f64,
        radius_km: f64,
    ) -> CoreResult<Vec<NearbyEvent>> {
        let filter = EventFilter {
            viewer: Some(actor.user_id),
            participant_only: false,
            starts_after: Some(Utc::now()),
            sport_type: None,
            skill_level: None,
            status: Some(EventStatus::Scheduled),
        };
        let events = self.ctx.events.list(&filter).await?;

        let mut nearby: Vec<NearbyEvent> = events
            .into_iter()
            .filter_map(|event| {
                let distance_km =
                    haversine_km(lat, lng, event.location.lat, event.location.lng);
                if distance_km.is_finite() && distance_km <= radius_km {
                    Some(NearbyEvent { event, distance_km })
                } else {
                    None
                }
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(nearby)
    }

    async fn find(&self, id: Uuid) -> CoreResult<Event> {
        self.ctx
            .events
            .find(id)
            .await?
            .ok_or(CoreError::NotFound("event"))
    }

    async fn display_name(&self, user_id: Uuid) -> String {
        match self.ctx.users.find(user_id).await {
            Ok(Some(user)) => user.display_name(),
            _ => "A player".to_string(),
        }
    }
}
