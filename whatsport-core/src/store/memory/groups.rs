use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::lock;
use crate::error::CoreResult;
use crate::store::GroupStore;
use crate::types::Group;

#[derive(Default)]
pub struct MemoryGroupStore {
    rows: Mutex<HashMap<Uuid, Group>>,
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn insert(&self, group: &Group) -> CoreResult<()> {
        lock(&self.rows, "group")?.insert(group.id, group.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Group>> {
        Ok(lock(&self.rows, "group")?.get(&id).cloned())
    }

    async fn update(&self, group: &Group, expected_version: i32) -> CoreResult<bool> {
        let mut rows = lock(&self.rows, "group")?;
        match rows.get(&group.id) {
            Some(stored) if stored.version == expected_version => {
                rows.insert(group.id, group.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        Ok(lock(&self.rows, "group")?.remove(&id).is_some())
    }

    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Group>> {
        let mut out: Vec<Group> = lock(&self.rows, "group")?
            .values()
            .filter(|g| g.member(user_id).is_some())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}
