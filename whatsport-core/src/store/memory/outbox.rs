use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use super::lock;
use crate::error::CoreResult;
use crate::store::OutboxStore;
use crate::types::{NewOutboxRecord, OutboxRecord};

#[derive(Default)]
pub struct MemoryOutboxStore {
    rows: Mutex<Vec<OutboxRecord>>,
    next_id: Mutex<i64>,
}

#[async_trait]
impl OutboxStore for MemoryOutboxStore {
    async fn append(&self, record: NewOutboxRecord) -> CoreResult<()> {
        let id = {
            let mut next = lock(&self.next_id, "outbox")?;
            *next += 1;
            *next
        };
        lock(&self.rows, "outbox")?.push(OutboxRecord {
            id,
            recipient_id: record.recipient_id,
            kind: record.kind,
            title: record.title,
            message: record.message,
            related_id: record.related_id,
            action_url: record.action_url,
            created_at: Utc::now(),
            dispatched_at: None,
            retry_count: 0,
            error_message: None,
        });
        Ok(())
    }

    async fn due(&self, max_retries: i32, limit: i64) -> CoreResult<Vec<OutboxRecord>> {
        Ok(lock(&self.rows, "outbox")?
            .iter()
            .filter(|r| r.dispatched_at.is_none() && r.retry_count < max_retries)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_dispatched(&self, id: i64) -> CoreResult<()> {
        let mut rows = lock(&self.rows, "outbox")?;
        if let Some(record) = rows.iter_mut().find(|r| r.id == id) {
            record.dispatched_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> CoreResult<()> {
        let mut rows = lock(&self.rows, "outbox")?;
        if let Some(record) = rows.iter_mut().find(|r| r.id == id) {
            record.retry_count += 1;
            record.error_message = Some(error.to_string());
        }
        Ok(())
    }
}
