use chrono::Utc;
use uuid::Uuid;

use whatsport_core::error::{CoreError, CoreResult};
use whatsport_core::types::{pair_key, Actor, Friendship, FriendshipStatus};
use whatsport_core::AppContext;
use whatsport_notify::fanout;

/// Symmetric friendship relation: one record per unordered pair, stored
/// under the canonical key, with `requested_by`/`blocked_by` carrying
/// direction. "Unblock" and "cancel" delete the record; there is no
/// resurrect path through status alone.
pub struct FriendshipService {
    ctx: AppContext,
}

impl FriendshipService {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub async fn send_request(&self, actor: &Actor, receiver_id: Uuid) -> CoreResult<Friendship> {
        if receiver_id == actor.user_id {
            return Err(CoreError::validation(
                "cannot send a friend request to yourself",
            ));
        }
        if self.ctx.users.find(receiver_id).await?.is_none() {
            return Err(CoreError::NotFound("user"));
        }

        let (user_lo, user_hi) = pair_key(actor.user_id, receiver_id);
        if self.ctx.friendships.find_pair(user_lo, user_hi).await?.is_some() {
            // Any existing record, whatever its status, blocks a new one.
            return Err(CoreError::AlreadyExists("friendship"));
        }

        let now = Utc::now();
        let friendship = Friendship {
            id: Uuid::new_v4(),
            user_lo,
            user_hi,
            requested_by: actor.user_id,
            status: FriendshipStatus::Pending,
            blocked_by: None,
            created_at: now,
            updated_at: now,
        };
        self.ctx.friendships.insert(&friendship).await?;

        let sender_name = self.display_name(actor.user_id).await;
        fanout::enqueue(
            &self.ctx,
            fanout::friend_request(receiver_id, &sender_name, friendship.id),
        )
        .await;

        Ok(friendship)
    }

    pub async fn respond(&self, actor: &Actor, id: Uuid, accept: bool) -> CoreResult<Friendship> {
        let mut friendship = self.find(id).await?;

        if !friendship.involves(actor.user_id) || friendship.requested_by == actor.user_id {
            return Err(CoreError::unauthorized(
                "only the requested party can respond to a friend request",
            ));
        }
        if friendship.status != FriendshipStatus::Pending {
            return Err(CoreError::invalid_transition(format!(
                "cannot respond to a {} friend request",
                friendship.status
            )));
        }

        let new_status = if accept {
            FriendshipStatus::Accepted
        } else {
            FriendshipStatus::Declined
        };
        let swapped = self
            .ctx
            .friendships
            .update_status(id, FriendshipStatus::Pending, new_status)
            .await?;
        if !swapped {
            return Err(CoreError::invalid_transition(
                "the friend request is no longer pending",
            ));
        }

        friendship.status = new_status;

        let responder_name = self.display_name(actor.user_id).await;
        let draft = if accept {
            fanout::friend_accepted(friendship.requested_by, &responder_name, friendship.id)
        } else {
            fanout::friend_declined(friendship.requested_by, &responder_name, friendship.id)
        };
        fanout::enqueue(&self.ctx, draft).await;

        Ok(friendship)
    }

    /// Withdrawing a pending request deletes the record; no terminal
    /// "canceled" state is kept.
    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> CoreResult<()> {
        let friendship = self.find(id).await?;

        if friendship.requested_by != actor.user_id {
            return Err(CoreError::unauthorized(
                "only the requester can cancel a friend request",
            ));
        }
        if friendship.status != FriendshipStatus::Pending {
            return Err(CoreError::invalid_transition(format!(
                "cannot cancel a {} friend request",
                friendship.status
            )));
        }

        self.ctx.friendships.delete(id).await?;
        Ok(())
    }

    pub async fn remove(&self, actor: &Actor, id: Uuid) -> CoreResult<()> {
        let friendship = self.find(id).await?;

        if !friendship.involves(actor.user_id) {
            return Err(CoreError::unauthorized("no access to this friendship"));
        }
        if friendship.status != FriendshipStatus::Accepted {
            return Err(CoreError::invalid_transition(format!(
                "cannot remove a {} friendship",
                friendship.status
            )));
        }

        self.ctx.friendships.delete(id).await?;

        let remover_name = self.display_name(actor.user_id).await;
        fanout::enqueue(
            &self.ctx,
            fanout::friend_removed(friendship.other_party(actor.user_id), &remover_name),
        )
        .await;

        Ok(())
    }

    /// Blocks from any prior state, or creates a blocked record when none
    /// exists. Deliberately silent: the blocked party is never notified.
    pub async fn block(&self, actor: &Actor, target_id: Uuid) -> CoreResult<Friendship> {
        if target_id == actor.user_id {
            return Err(CoreError::validation("cannot block yourself"));
        }
        if self.ctx.users.find(target_id).await?.is_none() {
            return Err(CoreError::NotFound("user"));
        }

        let (user_lo, user_hi) = pair_key(actor.user_id, target_id);
        if let Some(mut existing) = self.ctx.friendships.find_pair(user_lo, user_hi).await? {
            self.ctx
                .friendships
                .set_blocked(existing.id, actor.user_id)
                .await?;
            existing.status = FriendshipStatus::Blocked;
            existing.blocked_by = Some(actor.user_id);
            return Ok(existing);
        }

        let now = Utc::now();
        let friendship = Friendship {
            id: Uuid::new_v4(),
            user_lo,
            user_hi,
            requested_by: actor.user_id,
            status: FriendshipStatus::Blocked,
            blocked_by: Some(actor.user_id),
            created_at: now,
            updated_at: now,
        };
        self.ctx.friendships.insert(&friendship).await?;
        Ok(friendship)
    }

    /// Only the blocker can unblock; the record is deleted so a fresh
    /// relation can be started from scratch.
    pub async fn unblock(&self, actor: &Actor, id: Uuid) -> CoreResult<()> {
        let friendship = self.find(id).await?;

        if friendship.status != FriendshipStatus::Blocked {
            return Err(CoreError::invalid_transition(
                "this friendship is not blocked",
            ));
        }
        if friendship.blocked_by != Some(actor.user_id) {
            return Err(CoreError::unauthorized(
                "only the user who blocked can unblock",
            ));
        }

        self.ctx.friendships.delete(id).await?;
        Ok(())
    }

    /// Status of the relation between two users, whichever way it was
    /// created.
    pub async fn status(&self, user_a: Uuid, user_b: Uuid) -> CoreResult<Option<Friendship>> {
        let (user_lo, user_hi) = pair_key(user_a, user_b);
        self.ctx.friendships.find_pair(user_lo, user_hi).await
    }

    pub async fn list_for_user(
        &self,
        actor: &Actor,
        status: Option<FriendshipStatus>,
    ) -> CoreResult<Vec<Friendship>> {
        self.ctx.friendships.list_for_user(actor.user_id, status).await
    }

    async fn find(&self, id: Uuid) -> CoreResult<Friendship> {
        self.ctx
            .friendships
            .find(id)
            .await?
            .ok_or(CoreError::NotFound("friendship"))
    }

    async fn display_name(&self, user_id: Uuid) -> String {
        match self.ctx.users.find(user_id).await {
            Ok(Some(user)) => user.display_name(),
            _ => "Someone".to_string(),
        }
    }
}
