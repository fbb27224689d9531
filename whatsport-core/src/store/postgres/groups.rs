use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::error::{CoreError, CoreResult};
use crate::schema::social_groups;
use crate::store::GroupStore;
use crate::types::Group;

pub struct PgGroupStore {
    pool: Arc<DbPool>,
}

impl PgGroupStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CoreResult<DbConnection> {
        Ok(self.pool.get().await?)
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = social_groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct GroupRow {
    id: Uuid,
    name: String,
    description: String,
    creator_id: Uuid,
    is_private: bool,
    members: serde_json::Value,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GroupRow> for Group {
    type Error = CoreError;

    fn try_from(row: GroupRow) -> CoreResult<Group> {
        Ok(Group {
            id: row.id,
            name: row.name,
            description: row.description,
            creator_id: row.creator_id,
            is_private: row.is_private,
            members: serde_json::from_value(row.members)?,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<&Group> for GroupRow {
    type Error = CoreError;

    fn try_from(group: &Group) -> CoreResult<GroupRow> {
        Ok(GroupRow {
            id: group.id,
            name: group.name.clone(),
            description: group.description.clone(),
            creator_id: group.creator_id,
            is_private: group.is_private,
            members: serde_json::to_value(&group.members)?,
            version: group.version,
            created_at: group.created_at,
            updated_at: group.updated_at,
        })
    }
}

#[async_trait]
impl GroupStore for PgGroupStore {
    async fn insert(&self, group: &Group) -> CoreResult<()> {
        let row = GroupRow::try_from(group)?;
        let mut conn = self.conn().await?;
        diesel::insert_into(social_groups::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Group>> {
        let mut conn = self.conn().await?;
        let row: Option<GroupRow> = social_groups::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        row.map(Group::try_from).transpose()
    }

    async fn update(&self, group: &Group, expected_version: i32) -> CoreResult<bool> {
        let row = GroupRow::try_from(group)?;
        let mut conn = self.conn().await?;
        let updated = diesel::update(
            social_groups::table
                .filter(social_groups::id.eq(group.id))
                .filter(social_groups::version.eq(expected_version)),
        )
        .set(&row)
        .execute(&mut conn)
        .await?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(social_groups::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Group>> {
        let mut conn = self.conn().await?;
        let rows: Vec<GroupRow> = social_groups::table
            .filter(social_groups::members.contains(serde_json::json!([{ "user_id": user_id }])))
            .order(social_groups::name.asc())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(Group::try_from).collect()
    }
}
