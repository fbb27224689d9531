use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::error::{CoreError, CoreResult};
use crate::schema::outbox;
use crate::store::OutboxStore;
use crate::types::{NewOutboxRecord, OutboxRecord};

pub struct PgOutboxStore {
    pool: Arc<DbPool>,
}

impl PgOutboxStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CoreResult<DbConnection> {
        Ok(self.pool.get().await?)
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct OutboxRow {
    id: i64,
    recipient_id: Uuid,
    kind: String,
    title: String,
    message: String,
    related_id: Option<Uuid>,
    action_url: Option<String>,
    created_at: DateTime<Utc>,
    dispatched_at: Option<DateTime<Utc>>,
    retry_count: i32,
    error_message: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = outbox)]
struct NewOutboxRow {
    recipient_id: Uuid,
    kind: String,
    title: String,
    message: String,
    related_id: Option<Uuid>,
    action_url: Option<String>,
}

impl TryFrom<OutboxRow> for OutboxRecord {
    type Error = CoreError;

    fn try_from(row: OutboxRow) -> CoreResult<OutboxRecord> {
        Ok(OutboxRecord {
            id: row.id,
            recipient_id: row.recipient_id,
            kind: row.kind.parse()?,
            title: row.title,
            message: row.message,
            related_id: row.related_id,
            action_url: row.action_url,
            created_at: row.created_at,
            dispatched_at: row.dispatched_at,
            retry_count: row.retry_count,
            error_message: row.error_message,
        })
    }
}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    async fn append(&self, record: NewOutboxRecord) -> CoreResult<()> {
        let row = NewOutboxRow {
            recipient_id: record.recipient_id,
            kind: record.kind.as_str().to_string(),
            title: record.title,
            message: record.message,
            related_id: record.related_id,
            action_url: record.action_url,
        };
        let mut conn = self.conn().await?;
        diesel::insert_into(outbox::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn due(&self, max_retries: i32, limit: i64) -> CoreResult<Vec<OutboxRecord>> {
        let mut conn = self.conn().await?;
        let rows: Vec<OutboxRow> = outbox::table
            .filter(outbox::dispatched_at.is_null())
            .filter(outbox::retry_count.lt(max_retries))
            .order(outbox::created_at.asc())
            .limit(limit)
            .select(OutboxRow::as_select())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(OutboxRecord::try_from).collect()
    }

    async fn mark_dispatched(&self, id: i64) -> CoreResult<()> {
        let mut conn = self.conn().await?;
        diesel::update(outbox::table.filter(outbox::id.eq(id)))
            .set(outbox::dispatched_at.eq(Utc::now()))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> CoreResult<()> {
        let mut conn = self.conn().await?;
        diesel::update(outbox::table.filter(outbox::id.eq(id)))
            .set((
                outbox::retry_count.eq(outbox::retry_count + 1),
                outbox::error_message.eq(error.to_string()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
