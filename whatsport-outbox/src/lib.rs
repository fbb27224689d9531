pub mod dispatcher;

pub use dispatcher::{run, OutboxDispatcher};
