pub mod fanout;
pub mod service;

pub use fanout::Draft;
pub use service::{NotificationCounts, NotificationService};
