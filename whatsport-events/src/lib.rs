pub mod service;

pub use service::{CreateEvent, EventService, ListEvents, NearbyEvent, UpdateEvent};
