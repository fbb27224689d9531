pub mod service;
pub mod spaces;

pub use service::{CreateReservation, ManagerDashboard, ReservationService};
pub use spaces::{CreateSpace, SpaceService, UpdateSpace};
