use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use whatsport_core::error::{CoreError, CoreResult};
use whatsport_core::types::{Actor, Group, GroupMember, GroupRole};
use whatsport_core::AppContext;
use whatsport_notify::fanout;

const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Group membership machine. Admin checks always run against the freshly
/// read member list, and member-list writes are version-guarded, so a role
/// change between read and write makes the write miss and retry.
pub struct GroupService {
    ctx: AppContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_private: bool,
}

impl GroupService {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, actor: &Actor, req: CreateGroup) -> CoreResult<Group> {
        if req.name.trim().is_empty() {
            return Err(CoreError::validation("a group needs a name"));
        }

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            creator_id: actor.user_id,
            is_private: req.is_private,
            members: vec![GroupMember {
                user_id: actor.user_id,
                role: GroupRole::Admin,
                joined_at: now,
            }],
            version: 0,
            created_at: now,
            updated_at: now,
        };
        self.ctx.groups.insert(&group).await?;
        Ok(group)
    }

    pub async fn invite(&self, actor: &Actor, group_id: Uuid, user_id: Uuid) -> CoreResult<Group> {
        if self.ctx.users.find(user_id).await?.is_none() {
            return Err(CoreError::NotFound("user"));
        }

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let group = self.find(group_id).await?;
            require_admin(&group, actor)?;

            if group.member(user_id).is_some() {
                return Err(CoreError::AlreadyMember);
            }

            let expected = group.version;
            let mut updated = group;
            updated.members.push(GroupMember {
                user_id,
                role: GroupRole::Member,
                joined_at: Utc::now(),
            });
            updated.version = expected + 1;
            updated.updated_at = Utc::now();

            if self.ctx.groups.update(&updated, expected).await? {
                let inviter_name = self.display_name(actor.user_id).await;
                fanout::enqueue(
                    &self.ctx,
                    fanout::group_invitation(user_id, &updated, &inviter_name),
                )
                .await;
                return Ok(updated);
            }
        }

        Err(CoreError::conflict("the group membership changed concurrently"))
    }

    pub async fn change_role(
        &self,
        actor: &Actor,
        group_id: Uuid,
        user_id: Uuid,
        new_role: GroupRole,
    ) -> CoreResult<Group> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let group = self.find(group_id).await?;
            require_admin(&group, actor)?;

            let member = group
                .member(user_id)
                .ok_or(CoreError::NotFound("group member"))?;

            // Demoting the last admin would strand the group.
            if member.role == GroupRole::Admin
                && new_role == GroupRole::Member
                && group
                    .members
                    .iter()
                    .filter(|m| m.role == GroupRole::Admin)
                    .count()
                    == 1
            {
                return Err(CoreError::validation(
                    "a group must keep at least one admin",
                ));
            }

            let expected = group.version;
            let mut updated = group;
            for m in &mut updated.members {
                if m.user_id == user_id {
                    m.role = new_role;
                }
            }
            updated.version = expected + 1;
            updated.updated_at = Utc::now();

            if self.ctx.groups.update(&updated, expected).await? {
                if user_id != actor.user_id {
                    fanout::enqueue(
                        &self.ctx,
                        fanout::group_role_changed(user_id, &updated, new_role),
                    )
                    .await;
                }
                return Ok(updated);
            }
        }

        Err(CoreError::conflict("the group membership changed concurrently"))
    }

    pub async fn remove_member(
        &self,
        actor: &Actor,
        group_id: Uuid,
        user_id: Uuid,
    ) -> CoreResult<Group> {
        if user_id == actor.user_id {
            return Err(CoreError::validation(
                "admins leave through the leave operation",
            ));
        }

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let group = self.find(group_id).await?;
            require_admin(&group, actor)?;

            if group.member(user_id).is_none() {
                return Err(CoreError::NotFound("group member"));
            }

            let expected = group.version;
            let mut updated = group;
            updated.members.retain(|m| m.user_id != user_id);
            updated.version = expected + 1;
            updated.updated_at = Utc::now();

            if self.ctx.groups.update(&updated, expected).await? {
                fanout::enqueue(&self.ctx, fanout::group_member_removed(user_id, &updated)).await;
                return Ok(updated);
            }
        }

        Err(CoreError::conflict("the group membership changed concurrently"))
    }

    /// The last member leaving deletes the group; a sole admin leaving a
    /// populated group first promotes the earliest-joined non-admin.
    pub async fn leave(&self, actor: &Actor, group_id: Uuid) -> CoreResult<Option<Group>> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let group = self.find(group_id).await?;

            let member = group
                .member(actor.user_id)
                .ok_or(CoreError::NotFound("group member"))?;

            if group.members.len() == 1 {
                self.ctx.groups.delete(group.id).await?;
                return Ok(None);
            }

            let sole_admin = member.role == GroupRole::Admin
                && group
                    .members
                    .iter()
                    .filter(|m| m.role == GroupRole::Admin)
                    .count()
                    == 1;

            let expected = group.version;
            let mut updated = group;

            if sole_admin {
                let successor = updated
                    .members
                    .iter()
                    .filter(|m| m.user_id != actor.user_id)
                    .min_by_key(|m| m.joined_at)
                    .map(|m| m.user_id);
                if let Some(successor) = successor {
                    for m in &mut updated.members {
                        if m.user_id == successor {
                            m.role = GroupRole::Admin;
                        }
                    }
                }
            }

            updated.members.retain(|m| m.user_id != actor.user_id);
            updated.version = expected + 1;
            updated.updated_at = Utc::now();

            if self.ctx.groups.update(&updated, expected).await? {
                return Ok(Some(updated));
            }
        }

        Err(CoreError::conflict("the group membership changed concurrently"))
    }

    /// Deletes the group and notifies every member other than the acting
    /// admin individually.
    pub async fn delete(&self, actor: &Actor, group_id: Uuid) -> CoreResult<()> {
        let group = self.find(group_id).await?;
        require_admin(&group, actor)?;

        self.ctx.groups.delete(group.id).await?;

        for member in &group.members {
            if member.user_id != actor.user_id {
                fanout::enqueue(&self.ctx, fanout::group_deleted(member.user_id, &group.name))
                    .await;
            }
        }
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, group_id: Uuid) -> CoreResult<Group> {
        let group = self.find(group_id).await?;
        if group.is_private && group.member(actor.user_id).is_none() {
            return Err(CoreError::unauthorized("this is a private group"));
        }
        Ok(group)
    }

    pub async fn list_for_user(&self, actor: &Actor) -> CoreResult<Vec<Group>> {
        self.ctx.groups.list_for_user(actor.user_id).await
    }

    async fn find(&self, id: Uuid) -> CoreResult<Group> {
        self.ctx
            .groups
            .find(id)
            .await?
            .ok_or(CoreError::NotFound("group"))
    }

    async fn display_name(&self, user_id: Uuid) -> String {
        match self.ctx.users.find(user_id).await {
            Ok(Some(user)) => user.display_name(),
            _ => "Someone".to_string(),
        }
    }
}

fn require_admin(group: &Group, actor: &Actor) -> CoreResult<()> {
    if !group.is_admin(actor.user_id) {
        return Err(CoreError::unauthorized(
            "only group admins can perform this action",
        ));
    }
    Ok(())
}
