pub mod friendships;
pub mod groups;

pub use friendships::FriendshipService;
pub use groups::{CreateGroup, GroupService};
