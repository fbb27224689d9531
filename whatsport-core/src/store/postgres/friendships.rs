use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::error::{CoreError, CoreResult};
use crate::schema::friendships;
use crate::store::FriendshipStore;
use crate::types::{Friendship, FriendshipStatus};

pub struct PgFriendshipStore {
    pool: Arc<DbPool>,
}

impl PgFriendshipStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CoreResult<DbConnection> {
        Ok(self.pool.get().await?)
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = friendships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct FriendshipRow {
    id: Uuid,
    user_lo: Uuid,
    user_hi: Uuid,
    requested_by: Uuid,
    status: String,
    blocked_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FriendshipRow> for Friendship {
    type Error = CoreError;

    fn try_from(row: FriendshipRow) -> CoreResult<Friendship> {
        Ok(Friendship {
            id: row.id,
            user_lo: row.user_lo,
            user_hi: row.user_hi,
            requested_by: row.requested_by,
            status: row.status.parse()?,
            blocked_by: row.blocked_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Friendship> for FriendshipRow {
    fn from(f: &Friendship) -> FriendshipRow {
        FriendshipRow {
            id: f.id,
            user_lo: f.user_lo,
            user_hi: f.user_hi,
            requested_by: f.requested_by,
            status: f.status.as_str().to_string(),
            blocked_by: f.blocked_by,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[async_trait]
impl FriendshipStore for PgFriendshipStore {
    async fn insert(&self, friendship: &Friendship) -> CoreResult<()> {
        let row = FriendshipRow::from(friendship);
        let mut conn = self.conn().await?;
        diesel::insert_into(friendships::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => CoreError::AlreadyExists("friendship"),
                other => other.into(),
            })?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Friendship>> {
        let mut conn = self.conn().await?;
        let row: Option<FriendshipRow> = friendships::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        row.map(Friendship::try_from).transpose()
    }

    async fn find_pair(&self, user_lo: Uuid, user_hi: Uuid) -> CoreResult<Option<Friendship>> {
        let mut conn = self.conn().await?;
        let row: Option<FriendshipRow> = friendships::table
            .filter(friendships::user_lo.eq(user_lo))
            .filter(friendships::user_hi.eq(user_hi))
            .first(&mut conn)
            .await
            .optional()?;
        row.map(Friendship::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: FriendshipStatus,
        new: FriendshipStatus,
    ) -> CoreResult<bool> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(
            friendships::table
                .filter(friendships::id.eq(id))
                .filter(friendships::status.eq(expected.as_str())),
        )
        .set((
            friendships::status.eq(new.as_str()),
            friendships::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await?;
        Ok(updated > 0)
    }

    async fn set_blocked(&self, id: Uuid, blocked_by: Uuid) -> CoreResult<bool> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(friendships::table.find(id))
            .set((
                friendships::status.eq(FriendshipStatus::Blocked.as_str()),
                friendships::blocked_by.eq(blocked_by),
                friendships::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(friendships::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<FriendshipStatus>,
    ) -> CoreResult<Vec<Friendship>> {
        let mut conn = self.conn().await?;
        let mut query = friendships::table
            .filter(
                friendships::user_lo
                    .eq(user_id)
                    .or(friendships::user_hi.eq(user_id)),
            )
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(friendships::status.eq(status.as_str()));
        }
        let rows: Vec<FriendshipRow> = query
            .order(friendships::created_at.desc())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(Friendship::try_from).collect()
    }
}
