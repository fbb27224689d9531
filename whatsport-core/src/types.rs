use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Identity of the caller, resolved by the session subsystem and passed
/// explicitly into every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn player(user_id: Uuid) -> Self {
        Actor { user_id, role: Role::Player }
    }

    pub fn manager(user_id: Uuid) -> Self {
        Actor { user_id, role: Role::Manager }
    }
}

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant)),+,
                    other => Err(CoreError::store(format!(
                        concat!("unknown ", stringify!($name), " token: {}"),
                        other
                    ))),
                }
            }
        }
    };
}

status_enum!(Role {
    Player => "player",
    Manager => "manager",
});

status_enum!(SpaceStatus {
    Active => "active",
    Inactive => "inactive",
    PendingApproval => "pending_approval",
});

status_enum!(ReservationStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Canceled => "canceled",
    Completed => "completed",
});

status_enum!(EventStatus {
    Scheduled => "scheduled",
    Canceled => "canceled",
    Completed => "completed",
});

status_enum!(FriendshipStatus {
    Pending => "pending",
    Accepted => "accepted",
    Declined => "declined",
    Blocked => "blocked",
});

status_enum!(GroupRole {
    Admin => "admin",
    Member => "member",
});

status_enum!(NotificationKind {
    ReservationRequest => "reservation_request",
    ReservationApproved => "reservation_approved",
    ReservationRejected => "reservation_rejected",
    ReservationCanceled => "reservation_canceled",
    ReservationCompleted => "reservation_completed",
    EventNewParticipant => "event_new_participant",
    EventParticipantLeft => "event_participant_left",
    EventUpdated => "event_updated",
    EventCanceled => "event_canceled",
    FriendRequest => "friend_request",
    FriendAccepted => "friend_accepted",
    FriendDeclined => "friend_declined",
    FriendRemoved => "friend_removed",
    GroupInvitation => "group_invitation",
    GroupRoleChanged => "group_role_changed",
    GroupMemberRemoved => "group_member_removed",
    GroupDeleted => "group_deleted",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSport {
    pub sport_type: String,
    pub skill_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub sports: Vec<PlayerSport>,
    pub company_name: Option<String>,
    pub company_document: Option<String>,
    pub bank_info: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name used in notification messages; falls back to the local
    /// part of the email address like the account-creation flow does.
    pub fn display_name(&self) -> String {
        match &self.full_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.email.split('@').next().unwrap_or("someone").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportOffering {
    pub sport_type: String,
    pub price_per_hour: f64,
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Daily opening window, `"HH:MM"` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub opens_at: String,
    pub closes_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub available_sports: Vec<SportOffering>,
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Keyed by weekday `"0"`..`"6"`, `0` = Monday. A missing key means the
    /// space is closed that day.
    pub opening_hours: BTreeMap<String, OpeningHours>,
    pub manager_id: Uuid,
    pub status: SpaceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Space {
    pub fn offering(&self, sport_type: &str) -> Option<&SportOffering> {
        self.available_sports.iter().find(|s| s.sport_type == sport_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: Uuid,
    pub confirmed: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub sport_type: String,
    pub skill_level: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Location,
    pub max_participants: i32,
    pub participants: Vec<Participant>,
    pub organizer_id: Uuid,
    pub space_id: Option<Uuid>,
    pub space_name: Option<String>,
    pub price_per_person: f64,
    pub is_private: bool,
    pub status: EventStatus,
    /// Optimistic-concurrency counter; bumped on every roster or field write.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn participant(&self, user_id: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub space_id: Uuid,
    /// Snapshot of the space name at creation time.
    pub space_name: String,
    pub event_id: Option<Uuid>,
    pub organizer_id: Uuid,
    pub sport_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participants_count: i32,
    pub total_price: f64,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single record per unordered user pair; `user_lo < user_hi` by byte
/// order, with direction carried by `requested_by` / `blocked_by`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendship {
    pub id: Uuid,
    pub user_lo: Uuid,
    pub user_hi: Uuid,
    pub requested_by: Uuid,
    pub status: FriendshipStatus,
    pub blocked_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user_lo == user_id || self.user_hi == user_id
    }

    pub fn other_party(&self, user_id: Uuid) -> Uuid {
        if self.user_lo == user_id {
            self.user_hi
        } else {
            self.user_lo
        }
    }
}

/// Canonical storage key for an unordered user pair.
pub fn pair_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a.as_bytes() <= b.as_bytes() {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub user_id: Uuid,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub is_private: bool,
    pub members: Vec<GroupMember>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn member(&self, user_id: Uuid) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        matches!(self.member(user_id), Some(m) if m.role == GroupRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Pending fan-out record, drained into the notification collection by the
/// outbox dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: i64,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub action_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub error_message: Option<String>,
}

/// Outbox record as appended by a transition, before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewOutboxRecord {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub action_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tokens_round_trip() {
        assert_eq!(ReservationStatus::Pending.as_str(), "pending");
        assert_eq!(
            "pending_approval".parse::<SpaceStatus>().unwrap(),
            SpaceStatus::PendingApproval
        );
        assert_eq!(
            "reservation_approved".parse::<NotificationKind>().unwrap(),
            NotificationKind::ReservationApproved
        );
        assert!("unknown".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn pair_key_is_order_insensitive() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(pair_key(a, b), pair_key(b, a));
        assert_eq!(pair_key(a, a), (a, a));
    }

    #[test]
    fn status_serializes_as_lowercase_token() {
        let json = serde_json::to_string(&ReservationStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
