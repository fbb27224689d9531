use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use whatsport_core::error::{CoreError, CoreResult};
use whatsport_core::store::SpaceSearch;
use whatsport_core::types::{Actor, Location, OpeningHours, Role, Space, SpaceStatus, SportOffering};
use whatsport_core::AppContext;

/// Venue management. Spaces are referenced by reservations and events but
/// never owned by them; deletion is refused while future references exist.
pub struct SpaceService {
    ctx: AppContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSpace {
    pub name: String,
    pub description: String,
    pub location: Location,
    pub available_sports: Vec<SportOffering>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub opening_hours: BTreeMap<String, OpeningHours>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSpace {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub available_sports: Option<Vec<SportOffering>>,
    pub amenities: Option<Vec<String>>,
    pub opening_hours: Option<BTreeMap<String, OpeningHours>>,
}

impl SpaceService {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, actor: &Actor, req: CreateSpace) -> CoreResult<Space> {
        if actor.role != Role::Manager {
            return Err(CoreError::unauthorized("only managers can create spaces"));
        }
        if req.available_sports.is_empty() {
            return Err(CoreError::validation(
                "a space needs at least one available sport",
            ));
        }

        let now = Utc::now();
        let space = Space {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            location: req.location,
            available_sports: req.available_sports,
            amenities: req.amenities,
            opening_hours: req.opening_hours,
            manager_id: actor.user_id,
            status: SpaceStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.ctx.spaces.insert(&space).await?;
        Ok(space)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, req: UpdateSpace) -> CoreResult<Space> {
        let mut space = self.owned(actor, id).await?;

        if let Some(name) = req.name {
            space.name = name;
        }
        if let Some(description) = req.description {
            space.description = description;
        }
        if let Some(location) = req.location {
            space.location = location;
        }
        if let Some(sports) = req.available_sports {
            if sports.is_empty() {
                return Err(CoreError::validation(
                    "a space needs at least one available sport",
                ));
            }
            space.available_sports = sports;
        }
        if let Some(amenities) = req.amenities {
            space.amenities = amenities;
        }
        if let Some(opening_hours) = req.opening_hours {
            space.opening_hours = opening_hours;
        }
        space.updated_at = Utc::now();

        self.ctx.spaces.update(&space).await?;
        Ok(space)
    }

    pub async fn set_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: SpaceStatus,
    ) -> CoreResult<Space> {
        let mut space = self.owned(actor, id).await?;
        space.status = status;
        space.updated_at = Utc::now();
        self.ctx.spaces.update(&space).await?;
        Ok(space)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> CoreResult<()> {
        let space = self.owned(actor, id).await?;

        let now = Utc::now();
        if self.ctx.events.count_future_for_space(space.id, now).await? > 0 {
            return Err(CoreError::validation(
                "cannot delete a space with upcoming events",
            ));
        }
        if self
            .ctx
            .reservations
            .count_future_for_space(space.id, now)
            .await?
            > 0
        {
            return Err(CoreError::validation(
                "cannot delete a space with upcoming reservations",
            ));
        }

        self.ctx.spaces.delete(space.id).await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Space> {
        self.ctx
            .spaces
            .find(id)
            .await?
            .ok_or(CoreError::NotFound("space"))
    }

    pub async fn list_mine(&self, actor: &Actor) -> CoreResult<Vec<Space>> {
        self.ctx.spaces.list_by_manager(actor.user_id).await
    }

    pub async fn search(&self, filter: &SpaceSearch) -> CoreResult<Vec<Space>> {
        self.ctx.spaces.search(filter).await
    }

    async fn owned(&self, actor: &Actor, id: Uuid) -> CoreResult<Space> {
        let space = self
            .ctx
            .spaces
            .find(id)
            .await?
            .ok_or(CoreError::NotFound("space"))?;
        if space.manager_id != actor.user_id {
            return Err(CoreError::unauthorized("no access to this space"));
        }
        Ok(space)
    }
}
