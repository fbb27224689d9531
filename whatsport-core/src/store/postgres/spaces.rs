use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::error::{CoreError, CoreResult};
use crate::schema::spaces;
use crate::store::{SpaceSearch, SpaceStore};
use crate::types::{Location, Space};

pub struct PgSpaceStore {
    pool: Arc<DbPool>,
}

impl PgSpaceStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CoreResult<DbConnection> {
        Ok(self.pool.get().await?)
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = spaces)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct SpaceRow {
    id: Uuid,
    name: String,
    description: String,
    lat: f64,
    lng: f64,
    address: String,
    city: Option<String>,
    available_sports: serde_json::Value,
    amenities: serde_json::Value,
    opening_hours: serde_json::Value,
    manager_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SpaceRow> for Space {
    type Error = CoreError;

    fn try_from(row: SpaceRow) -> CoreResult<Space> {
        let opening_hours: BTreeMap<String, crate::types::OpeningHours> =
            serde_json::from_value(row.opening_hours)?;
        Ok(Space {
            id: row.id,
            name: row.name,
            description: row.description,
            location: Location {
                lat: row.lat,
                lng: row.lng,
                address: row.address,
                city: row.city,
            },
            available_sports: serde_json::from_value(row.available_sports)?,
            amenities: serde_json::from_value(row.amenities)?,
            opening_hours,
            manager_id: row.manager_id,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<&Space> for SpaceRow {
    type Error = CoreError;

    fn try_from(space: &Space) -> CoreResult<SpaceRow> {
        Ok(SpaceRow {
            id: space.id,
            name: space.name.clone(),
            description: space.description.clone(),
            lat: space.location.lat,
            lng: space.location.lng,
            address: space.location.address.clone(),
            city: space.location.city.clone(),
            available_sports: serde_json::to_value(&space.available_sports)?,
            amenities: serde_json::to_value(&space.amenities)?,
            opening_hours: serde_json::to_value(&space.opening_hours)?,
            manager_id: space.manager_id,
            status: space.status.as_str().to_string(),
            created_at: space.created_at,
            updated_at: space.updated_at,
        })
    }
}

fn rows_to_spaces(rows: Vec<SpaceRow>) -> CoreResult<Vec<Space>> {
    rows.into_iter().map(Space::try_from).collect()
}

#[async_trait]
impl SpaceStore for PgSpaceStore {
    async fn insert(&self, space: &Space) -> CoreResult<()> {
        let row = SpaceRow::try_from(space)?;
        let mut conn = self.conn().await?;
        diesel::insert_into(spaces::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Space>> {
        let mut conn = self.conn().await?;
        let row: Option<SpaceRow> = spaces::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        row.map(Space::try_from).transpose()
    }

    async fn update(&self, space: &Space) -> CoreResult<bool> {
        let row = SpaceRow::try_from(space)?;
        let mut conn = self.conn().await?;
        let updated = diesel::update(spaces::table.find(space.id))
            .set(&row)
            .execute(&mut conn)
            .await?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(spaces::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn list_by_manager(&self, manager_id: Uuid) -> CoreResult<Vec<Space>> {
        let mut conn = self.conn().await?;
        let rows: Vec<SpaceRow> = spaces::table
            .filter(spaces::manager_id.eq(manager_id))
            .order(spaces::created_at.desc())
            .load(&mut conn)
            .await?;
        rows_to_spaces(rows)
    }

    async fn search(&self, filter: &SpaceSearch) -> CoreResult<Vec<Space>> {
        let mut conn = self.conn().await?;
        let mut query = spaces::table.into_boxed();

        if let Some(term) = &filter.term {
            let pattern = format!("%{}%", term);
            query = query.filter(
                spaces::name
                    .ilike(pattern.clone())
                    .or(spaces::description.ilike(pattern)),
            );
        }
        if let Some(sport) = &filter.sport_type {
            query = query.filter(
                spaces::available_sports.contains(serde_json::json!([{ "sport_type": sport }])),
            );
        }
        if let Some(city) = &filter.city {
            query = query.filter(spaces::city.ilike(format!("%{}%", city)));
        }

        let rows: Vec<SpaceRow> = query.order(spaces::name.asc()).load(&mut conn).await?;
        rows_to_spaces(rows)
    }
}
