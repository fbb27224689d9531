use anyhow::Result;
use chrono::Utc;
use std::time::Duration;
use tracing;
use uuid::Uuid;

use whatsport_core::error::CoreResult;
use whatsport_core::types::{Notification, OutboxRecord};
use whatsport_core::AppContext;

/// Drains pending fan-out records into the notification collection.
///
/// A record that fails to materialize gets its retry count bumped and is
/// picked up again on a later poll; records at the retry ceiling are left
/// for inspection. The primary transition that enqueued the record is
/// never re-run.
pub struct OutboxDispatcher {
    ctx: AppContext,
}

pub async fn run(ctx: AppContext) -> Result<()> {
    tracing::info!("Starting outbox dispatcher");

    let poll_interval = Duration::from_millis(ctx.config.outbox.poll_interval_ms);
    let dispatcher = OutboxDispatcher::new(ctx);

    loop {
        match dispatcher.drain_once().await {
            Ok(dispatched) => {
                if dispatched > 0 {
                    tracing::debug!("Dispatched {} notifications", dispatched);
                }
                tokio::time::sleep(poll_interval).await;
            }
            Err(e) => {
                tracing::error!("Error in outbox dispatcher: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

impl OutboxDispatcher {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// One poll cycle; returns how many records were dispatched.
    pub async fn drain_once(&self) -> CoreResult<usize> {
        let outbox = &self.ctx.config.outbox;
        let due = self
            .ctx
            .outbox
            .due(outbox.max_retries, outbox.batch_size)
            .await?;

        if due.is_empty() {
            return Ok(0);
        }

        let mut dispatched = 0;
        for record in due {
            match self.deliver(&record).await {
                Ok(()) => {
                    self.ctx.outbox.mark_dispatched(record.id).await?;
                    dispatched += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to dispatch outbox record {}: {}", record.id, e);
                    self.ctx.outbox.mark_failed(record.id, &e.to_string()).await?;
                }
            }
        }

        Ok(dispatched)
    }

    async fn deliver(&self, record: &OutboxRecord) -> CoreResult<()> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: record.recipient_id,
            kind: record.kind,
            title: record.title.clone(),
            message: record.message.clone(),
            related_id: record.related_id,
            action_url: record.action_url.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        self.ctx.notifications.insert(&notification).await
    }
}
