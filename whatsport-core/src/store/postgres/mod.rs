//! Postgres store backend (diesel-async over a deadpool pool).
//!
//! Guarded writes are expressed as filtered UPDATEs checked through
//! `rows_affected`, so the compare-and-swap happens in the database.

mod events;
mod friendships;
mod groups;
mod notifications;
mod outbox;
mod reservations;
mod spaces;
mod users;

pub use events::PgEventStore;
pub use friendships::PgFriendshipStore;
pub use groups::PgGroupStore;
pub use notifications::PgNotificationStore;
pub use outbox::PgOutboxStore;
pub use reservations::PgReservationStore;
pub use spaces::PgSpaceStore;
pub use users::PgUserStore;
