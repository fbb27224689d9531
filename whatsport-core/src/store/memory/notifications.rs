use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::lock;
use crate::error::CoreResult;
use crate::store::NotificationStore;
use crate::types::Notification;

#[derive(Default)]
pub struct MemoryNotificationStore {
    rows: Mutex<HashMap<Uuid, Notification>>,
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> CoreResult<()> {
        lock(&self.rows, "notification")?.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Notification>> {
        Ok(lock(&self.rows, "notification")?.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> CoreResult<Vec<Notification>> {
        let mut out: Vec<Notification> = lock(&self.rows, "notification")?
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit.max(0) as usize);
        Ok(out)
    }

    async fn mark_read(&self, id: Uuid) -> CoreResult<bool> {
        let mut rows = lock(&self.rows, "notification")?;
        match rows.get_mut(&id) {
            Some(stored) if !stored.is_read => {
                stored.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_many_read(&self, user_id: Uuid, ids: &[Uuid]) -> CoreResult<usize> {
        let mut rows = lock(&self.rows, "notification")?;
        let mut flipped = 0;
        for id in ids {
            if let Some(stored) = rows.get_mut(id) {
                if stored.user_id == user_id && !stored.is_read {
                    stored.is_read = true;
                    flipped += 1;
                }
            }
        }
        Ok(flipped)
    }

    async fn counts(&self, user_id: Uuid) -> CoreResult<(i64, i64)> {
        let rows = lock(&self.rows, "notification")?;
        let total = rows.values().filter(|n| n.user_id == user_id).count() as i64;
        let unread = rows
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64;
        Ok((total, unread))
    }
}
