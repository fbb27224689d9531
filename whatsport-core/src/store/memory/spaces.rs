use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::lock;
use crate::error::CoreResult;
use crate::store::{SpaceSearch, SpaceStore};
use crate::types::Space;

#[derive(Default)]
pub struct MemorySpaceStore {
    rows: Mutex<HashMap<Uuid, Space>>,
}

#[async_trait]
impl SpaceStore for MemorySpaceStore {
    async fn insert(&self, space: &Space) -> CoreResult<()> {
        lock(&self.rows, "space")?.insert(space.id, space.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Space>> {
        Ok(lock(&self.rows, "space")?.get(&id).cloned())
    }

    async fn update(&self, space: &Space) -> CoreResult<bool> {
        let mut rows = lock(&self.rows, "space")?;
        if rows.contains_key(&space.id) {
            rows.insert(space.id, space.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        Ok(lock(&self.rows, "space")?.remove(&id).is_some())
    }

    async fn list_by_manager(&self, manager_id: Uuid) -> CoreResult<Vec<Space>> {
        let mut spaces: Vec<Space> = lock(&self.rows, "space")?
            .values()
            .filter(|s| s.manager_id == manager_id)
            .cloned()
            .collect();
        spaces.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(spaces)
    }

    async fn search(&self, filter: &SpaceSearch) -> CoreResult<Vec<Space>> {
        let term = filter.term.as_deref().map(str::to_lowercase);
        let city = filter.city.as_deref().map(str::to_lowercase);

        let mut spaces: Vec<Space> = lock(&self.rows, "space")?
            .values()
            .filter(|s| {
                if let Some(term) = &term {
                    if !s.name.to_lowercase().contains(term)
                        && !s.description.to_lowercase().contains(term)
                    {
                        return false;
                    }
                }
                if let Some(sport) = &filter.sport_type {
                    if s.offering(sport).is_none() {
                        return false;
                    }
                }
                if let Some(city) = &city {
                    match &s.location.city {
                        Some(c) if c.to_lowercase().contains(city) => {}
                        _ => return false,
                    }
                }
                true
            })
            .cloned()
            .collect();
        spaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(spaces)
    }
}
