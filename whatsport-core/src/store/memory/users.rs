use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::lock;
use crate::error::CoreResult;
use crate::store::UserStore;
use crate::types::User;

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> CoreResult<()> {
        lock(&self.rows, "user")?.insert(user.id, user.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(lock(&self.rows, "user")?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        Ok(lock(&self.rows, "user")?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update(&self, user: &User) -> CoreResult<bool> {
        let mut rows = lock(&self.rows, "user")?;
        if rows.contains_key(&user.id) {
            rows.insert(user.id, user.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
