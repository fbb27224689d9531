//! In-memory store backend.
//!
//! Mutex-guarded maps with the same guarded-write semantics as the
//! Postgres backend. Used by the service test suites and local tooling.

mod events;
mod friendships;
mod groups;
mod notifications;
mod outbox;
mod reservations;
mod spaces;
mod users;

pub use events::MemoryEventStore;
pub use friendships::MemoryFriendshipStore;
pub use groups::MemoryGroupStore;
pub use notifications::MemoryNotificationStore;
pub use outbox::MemoryOutboxStore;
pub use reservations::MemoryReservationStore;
pub use spaces::MemorySpaceStore;
pub use users::MemoryUserStore;

use std::sync::{Mutex, MutexGuard};

use crate::error::{CoreError, CoreResult};

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> CoreResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| CoreError::store(format!("{what} store lock poisoned")))
}
