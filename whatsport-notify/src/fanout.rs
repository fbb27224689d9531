//! Fan-out composition: one constructor per notification kind.
//!
//! Transitions build a `Draft` from the entities they already hold and
//! enqueue it on the outbox; the dispatcher turns drafts into notification
//! records. Enqueueing is deliberately non-fatal for the caller — the
//! primary write has already committed by the time fan-out happens.

use tracing;
use uuid::Uuid;

use whatsport_core::types::{
    Event, Group, GroupRole, NewOutboxRecord, NotificationKind, Reservation,
};
use whatsport_core::AppContext;

#[derive(Debug, Clone)]
pub struct Draft {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub action_url: Option<String>,
}

impl Draft {
    fn into_record(self) -> NewOutboxRecord {
        NewOutboxRecord {
            recipient_id: self.recipient_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            related_id: self.related_id,
            action_url: self.action_url,
        }
    }
}

/// Appends the draft to the outbox. Failures are logged, never propagated.
pub async fn enqueue(ctx: &AppContext, draft: Draft) {
    let kind = draft.kind;
    if let Err(e) = ctx.outbox.append(draft.into_record()).await {
        tracing::warn!("Failed to enqueue {} notification: {}", kind, e);
    }
}

pub fn reservation_request(
    manager_id: Uuid,
    reservation: &Reservation,
    organizer_name: &str,
) -> Draft {
    Draft {
        recipient_id: manager_id,
        kind: NotificationKind::ReservationRequest,
        title: "New reservation request".to_string(),
        message: format!(
            "New reservation from {} for {} at {}",
            organizer_name, reservation.sport_type, reservation.space_name
        ),
        related_id: Some(reservation.id),
        action_url: Some(format!("/manager/reservations/{}", reservation.id)),
    }
}

pub fn reservation_approved(reservation: &Reservation) -> Draft {
    Draft {
        recipient_id: reservation.organizer_id,
        kind: NotificationKind::ReservationApproved,
        title: "Reservation approved".to_string(),
        message: format!(
            "Your reservation for {} at {} was approved",
            reservation.sport_type, reservation.space_name
        ),
        related_id: Some(reservation.id),
        action_url: Some(format!("/player/reservations/{}", reservation.id)),
    }
}

pub fn reservation_rejected(reservation: &Reservation, reason: Option<&str>) -> Draft {
    let mut message = format!(
        "Your reservation for {} at {} was rejected",
        reservation.sport_type, reservation.space_name
    );
    if let Some(reason) = reason {
        message.push_str(". Reason: ");
        message.push_str(reason);
    }
    Draft {
        recipient_id: reservation.organizer_id,
        kind: NotificationKind::ReservationRejected,
        title: "Reservation rejected".to_string(),
        message,
        related_id: Some(reservation.id),
        action_url: Some(format!("/player/reservations/{}", reservation.id)),
    }
}

pub fn reservation_completed(reservation: &Reservation) -> Draft {
    Draft {
        recipient_id: reservation.organizer_id,
        kind: NotificationKind::ReservationCompleted,
        title: "Reservation completed".to_string(),
        message: format!(
            "Your reservation for {} at {} was marked as completed",
            reservation.sport_type, reservation.space_name
        ),
        related_id: Some(reservation.id),
        action_url: Some(format!("/player/reservations/{}", reservation.id)),
    }
}

pub fn reservation_canceled(
    manager_id: Uuid,
    reservation: &Reservation,
    organizer_name: &str,
) -> Draft {
    Draft {
        recipient_id: manager_id,
        kind: NotificationKind::ReservationCanceled,
        title: "Reservation canceled".to_string(),
        message: format!(
            "The reservation from {} for {} at {} was canceled by the organizer",
            organizer_name, reservation.sport_type, reservation.space_name
        ),
        related_id: Some(reservation.id),
        action_url: None,
    }
}

pub fn event_new_participant(event: &Event, joiner_name: &str) -> Draft {
    Draft {
        recipient_id: event.organizer_id,
        kind: NotificationKind::EventNewParticipant,
        title: "New participant".to_string(),
        message: format!("{} joined your event {}", joiner_name, event.title),
        related_id: Some(event.id),
        action_url: Some(format!("/events/{}", event.id)),
    }
}

pub fn event_participant_left(event: &Event, leaver_name: &str) -> Draft {
    Draft {
        recipient_id: event.organizer_id,
        kind: NotificationKind::EventParticipantLeft,
        title: "Participant left".to_string(),
        message: format!("{} left your event {}", leaver_name, event.title),
        related_id: Some(event.id),
        action_url: Some(format!("/events/{}", event.id)),
    }
}

pub fn event_updated(recipient_id: Uuid, event: &Event) -> Draft {
    Draft {
        recipient_id,
        kind: NotificationKind::EventUpdated,
        title: "Event updated".to_string(),
        message: format!("The event {} was updated by its organizer", event.title),
        related_id: Some(event.id),
        action_url: Some(format!("/events/{}", event.id)),
    }
}

pub fn event_canceled(recipient_id: Uuid, event: &Event) -> Draft {
    Draft {
        recipient_id,
        kind: NotificationKind::EventCanceled,
        title: "Event canceled".to_string(),
        message: format!("The event {} was canceled by its organizer", event.title),
        related_id: Some(event.id),
        action_url: None,
    }
}

pub fn friend_request(receiver_id: Uuid, sender_name: &str, friendship_id: Uuid) -> Draft {
    Draft {
        recipient_id: receiver_id,
        kind: NotificationKind::FriendRequest,
        title: "New friend request".to_string(),
        message: format!("{} sent you a friend request", sender_name),
        related_id: Some(friendship_id),
        action_url: Some("/friends/requests".to_string()),
    }
}

pub fn friend_accepted(requester_id: Uuid, responder_name: &str, friendship_id: Uuid) -> Draft {
    Draft {
        recipient_id: requester_id,
        kind: NotificationKind::FriendAccepted,
        title: "Friend request accepted".to_string(),
        message: format!("{} accepted your friend request", responder_name),
        related_id: Some(friendship_id),
        action_url: Some("/friends".to_string()),
    }
}

pub fn friend_declined(requester_id: Uuid, responder_name: &str, friendship_id: Uuid) -> Draft {
    Draft {
        recipient_id: requester_id,
        kind: NotificationKind::FriendDeclined,
        title: "Friend request declined".to_string(),
        message: format!("{} declined your friend request", responder_name),
        related_id: Some(friendship_id),
        action_url: None,
    }
}

pub fn friend_removed(recipient_id: Uuid, remover_name: &str) -> Draft {
    Draft {
        recipient_id,
        kind: NotificationKind::FriendRemoved,
        title: "Friend removed".to_string(),
        message: format!("{} removed you from their friends", remover_name),
        related_id: None,
        action_url: None,
    }
}

pub fn group_invitation(invitee_id: Uuid, group: &Group, inviter_name: &str) -> Draft {
    Draft {
        recipient_id: invitee_id,
        kind: NotificationKind::GroupInvitation,
        title: "Added to group".to_string(),
        message: format!("{} added you to the group {}", inviter_name, group.name),
        related_id: Some(group.id),
        action_url: Some(format!("/groups/{}", group.id)),
    }
}

pub fn group_role_changed(target_id: Uuid, group: &Group, new_role: GroupRole) -> Draft {
    Draft {
        recipient_id: target_id,
        kind: NotificationKind::GroupRoleChanged,
        title: "Group role changed".to_string(),
        message: format!("Your role in {} is now {}", group.name, new_role),
        related_id: Some(group.id),
        action_url: Some(format!("/groups/{}", group.id)),
    }
}

pub fn group_member_removed(target_id: Uuid, group: &Group) -> Draft {
    Draft {
        recipient_id: target_id,
        kind: NotificationKind::GroupMemberRemoved,
        title: "Removed from group".to_string(),
        message: format!("You were removed from the group {}", group.name),
        related_id: Some(group.id),
        action_url: None,
    }
}

pub fn group_deleted(recipient_id: Uuid, group_name: &str) -> Draft {
    Draft {
        recipient_id,
        kind: NotificationKind::GroupDeleted,
        title: "Group deleted".to_string(),
        message: format!("The group {} was deleted", group_name),
        related_id: None,
        action_url: None,
    }
}
