use serde::Serialize;
use uuid::Uuid;

use whatsport_core::error::{CoreError, CoreResult};
use whatsport_core::types::{Actor, Notification};
use whatsport_core::AppContext;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NotificationCounts {
    pub total: i64,
    pub unread: i64,
}

/// Read side of the notification sink. Records are append-only; the only
/// mutation is the idempotent unread-to-read flip.
pub struct NotificationService {
    ctx: AppContext,
}

impl NotificationService {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub async fn list_for_user(
        &self,
        actor: &Actor,
        limit: Option<i64>,
    ) -> CoreResult<Vec<Notification>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        self.ctx.notifications.list_for_user(actor.user_id, limit).await
    }

    pub async fn counts(&self, actor: &Actor) -> CoreResult<NotificationCounts> {
        let (total, unread) = self.ctx.notifications.counts(actor.user_id).await?;
        Ok(NotificationCounts { total, unread })
    }

    /// Marking an already-read notification is a no-op, not an error.
    pub async fn mark_read(&self, actor: &Actor, id: Uuid) -> CoreResult<Notification> {
        let notification = self
            .ctx
            .notifications
            .find(id)
            .await?
            .ok_or(CoreError::NotFound("notification"))?;

        if notification.user_id != actor.user_id {
            return Err(CoreError::unauthorized(
                "notifications can only be read by their recipient",
            ));
        }

        self.ctx.notifications.mark_read(id).await?;

        Ok(Notification { is_read: true, ..notification })
    }

    /// Marks the caller's own notifications among `ids`; returns how many
    /// actually flipped.
    pub async fn mark_many_read(&self, actor: &Actor, ids: &[Uuid]) -> CoreResult<usize> {
        self.ctx.notifications.mark_many_read(actor.user_id, ids).await
    }
}
