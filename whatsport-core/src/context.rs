use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::store::memory::{
    MemoryEventStore, MemoryFriendshipStore, MemoryGroupStore, MemoryNotificationStore,
    MemoryOutboxStore, MemoryReservationStore, MemorySpaceStore, MemoryUserStore,
};
use crate::store::postgres::{
    PgEventStore, PgFriendshipStore, PgGroupStore, PgNotificationStore, PgOutboxStore,
    PgReservationStore, PgSpaceStore, PgUserStore,
};
use crate::store::{
    EventStore, FriendshipStore, GroupStore, NotificationStore, OutboxStore, ReservationStore,
    SpaceStore, UserStore,
};

/// Shared handle passed into every service: configuration plus one store
/// handle per collection.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub spaces: Arc<dyn SpaceStore>,
    pub events: Arc<dyn EventStore>,
    pub reservations: Arc<dyn ReservationStore>,
    pub friendships: Arc<dyn FriendshipStore>,
    pub groups: Arc<dyn GroupStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub outbox: Arc<dyn OutboxStore>,
}

impl AppContext {
    /// Context backed by Postgres, for the running application.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database).await?;

        Ok(AppContext {
            config: Arc::new(config),
            users: Arc::new(PgUserStore::new(pool.clone())),
            spaces: Arc::new(PgSpaceStore::new(pool.clone())),
            events: Arc::new(PgEventStore::new(pool.clone())),
            reservations: Arc::new(PgReservationStore::new(pool.clone())),
            friendships: Arc::new(PgFriendshipStore::new(pool.clone())),
            groups: Arc::new(PgGroupStore::new(pool.clone())),
            notifications: Arc::new(PgNotificationStore::new(pool.clone())),
            outbox: Arc::new(PgOutboxStore::new(pool)),
        })
    }

    /// Context backed by in-memory stores; used by the test suites.
    pub fn in_memory() -> Self {
        let mut config = Config::from_env();
        config.database.url = "memory".to_string();

        AppContext {
            config: Arc::new(config),
            users: Arc::new(MemoryUserStore::default()),
            spaces: Arc::new(MemorySpaceStore::default()),
            events: Arc::new(MemoryEventStore::default()),
            reservations: Arc::new(MemoryReservationStore::default()),
            friendships: Arc::new(MemoryFriendshipStore::default()),
            groups: Arc::new(MemoryGroupStore::default()),
            notifications: Arc::new(MemoryNotificationStore::default()),
            outbox: Arc::new(MemoryOutboxStore::default()),
        }
    }
}
