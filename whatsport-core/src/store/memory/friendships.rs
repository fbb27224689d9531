use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::lock;
use crate::error::CoreResult;
use crate::store::FriendshipStore;
use crate::types::{Friendship, FriendshipStatus};

#[derive(Default)]
pub struct MemoryFriendshipStore {
    rows: Mutex<HashMap<Uuid, Friendship>>,
}

#[async_trait]
impl FriendshipStore for MemoryFriendshipStore {
    async fn insert(&self, friendship: &Friendship) -> CoreResult<()> {
        lock(&self.rows, "friendship")?.insert(friendship.id, friendship.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Friendship>> {
        Ok(lock(&self.rows, "friendship")?.get(&id).cloned())
    }

    async fn find_pair(&self, user_lo: Uuid, user_hi: Uuid) -> CoreResult<Option<Friendship>> {
        Ok(lock(&self.rows, "friendship")?
            .values()
            .find(|f| f.user_lo == user_lo && f.user_hi == user_hi)
            .cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: FriendshipStatus,
        new: FriendshipStatus,
    ) -> CoreResult<bool> {
        let mut rows = lock(&self.rows, "friendship")?;
        match rows.get_mut(&id) {
            Some(stored) if stored.status == expected => {
                stored.status = new;
                stored.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_blocked(&self, id: Uuid, blocked_by: Uuid) -> CoreResult<bool> {
        let mut rows = lock(&self.rows, "friendship")?;
        match rows.get_mut(&id) {
            Some(stored) => {
                stored.status = FriendshipStatus::Blocked;
                stored.blocked_by = Some(blocked_by);
                stored.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        Ok(lock(&self.rows, "friendship")?.remove(&id).is_some())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<FriendshipStatus>,
    ) -> CoreResult<Vec<Friendship>> {
        let mut out: Vec<Friendship> = lock(&self.rows, "friendship")?
            .values()
            .filter(|f| f.involves(user_id) && status.map_or(true, |s| f.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}
