use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::error::{CoreError, CoreResult};
use crate::schema::notifications;
use crate::store::NotificationStore;
use crate::types::Notification;

pub struct PgNotificationStore {
    pool: Arc<DbPool>,
}

impl PgNotificationStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CoreResult<DbConnection> {
        Ok(self.pool.get().await?)
    }
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    message: String,
    related_id: Option<Uuid>,
    action_url: Option<String>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = CoreError;

    fn try_from(row: NotificationRow) -> CoreResult<Notification> {
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind.parse()?,
            title: row.title,
            message: row.message,
            related_id: row.related_id,
            action_url: row.action_url,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> NotificationRow {
        NotificationRow {
            id: n.id,
            user_id: n.user_id,
            kind: n.kind.as_str().to_string(),
            title: n.title.clone(),
            message: n.message.clone(),
            related_id: n.related_id,
            action_url: n.action_url.clone(),
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, notification: &Notification) -> CoreResult<()> {
        let row = NotificationRow::from(notification);
        let mut conn = self.conn().await?;
        diesel::insert_into(notifications::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Notification>> {
        let mut conn = self.conn().await?;
        let row: Option<NotificationRow> = notifications::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        row.map(Notification::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> CoreResult<Vec<Notification>> {
        let mut conn = self.conn().await?;
        let rows: Vec<NotificationRow> = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order(notifications::created_at.desc())
            .limit(limit)
            .load(&mut conn)
            .await?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_read(&self, id: Uuid) -> CoreResult<bool> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::id.eq(id))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)
        .await?;
        Ok(updated > 0)
    }

    async fn mark_many_read(&self, user_id: Uuid, ids: &[Uuid]) -> CoreResult<usize> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::id.eq_any(ids.to_vec()))
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)
        .await?;
        Ok(updated)
    }

    async fn counts(&self, user_id: Uuid) -> CoreResult<(i64, i64)> {
        let mut conn = self.conn().await?;
        let total: i64 = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)
            .await?;
        let unread: i64 = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result(&mut conn)
            .await?;
        Ok((total, unread))
    }
}
