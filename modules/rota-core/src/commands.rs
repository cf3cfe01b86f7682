//! Command handlers: load a chore, apply one aggregate mutation, persist,
//! publish the event. Thin orchestration over the pieces in this crate.
//!
//! The read-modify-write cycle carries no cross-process lock: two handlers
//! racing on the same chore are last-writer-wins on the whole blob.

use std::sync::Arc;

use tracing::info;

use rota_common::RotaError;
use rota_store::Store;

use crate::access::{self, StructuralOp};
use crate::chore::Chore;
use crate::events::{ChoreEvent, CHORE_UPDATES_CHANNEL};
use crate::repo::ChoreRepo;
use crate::users::{User, UserRepo};

/// How to enroll someone: a free-text display name, or the email of a
/// registered account.
#[derive(Debug, Clone)]
pub enum AddPersonBy {
    Name(String),
    Email(String),
}

#[derive(Clone)]
pub struct ChoreService {
    store: Arc<dyn Store>,
    chores: ChoreRepo,
    users: UserRepo,
}

impl ChoreService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            chores: ChoreRepo::new(store.clone()),
            users: UserRepo::new(store.clone()),
            store,
        }
    }

    pub fn users(&self) -> &UserRepo {
        &self.users
    }

    /// Create a chore with `owner` enrolled as the first person.
    pub async fn create_chore(&self, owner: &User, name: &str) -> Result<Chore, RotaError> {
        let chore = Chore::new(name, &owner.id, &owner.name);
        self.chores.save(&chore).await?;
        self.track_membership(&owner.id, &chore.id).await?;

        info!(chore_id = %chore.id, owner_id = %owner.id, "chore created");
        self.publish(&ChoreEvent::ChoreCreated {
            chore_id: chore.id.clone(),
            chore: chore.clone(),
        })
        .await?;
        Ok(chore)
    }

    /// Fetch one chore, enforcing view access.
    pub async fn get_chore(&self, user_id: &str, chore_id: &str) -> Result<Chore, RotaError> {
        let chore = self.load(chore_id).await?;
        if !access::can_view(&chore, user_id) {
            return Err(RotaError::Forbidden("No access to this chore".into()));
        }
        Ok(chore)
    }

    /// Every chore the user may see.
    pub async fn list_chores(&self, user_id: &str) -> Result<Vec<Chore>, RotaError> {
        let chores = self.chores.all().await?;
        Ok(chores
            .into_iter()
            .filter(|c| access::can_view(c, user_id))
            .collect())
    }

    /// Join a chore by id. Knowing the id is the invitation.
    pub async fn join_chore(&self, user: &User, chore_id: &str) -> Result<Chore, RotaError> {
        let mut chore = self.load(chore_id).await?;
        if chore.person_for_user(&user.id).is_some() {
            return Err(RotaError::InvalidState(
                "You are already part of this chore".into(),
            ));
        }

        let person = chore.add_person(&user.name, Some(user.id.clone()))?;
        chore.share_with(&user.id);
        self.chores.save(&chore).await?;
        self.track_membership(&user.id, chore_id).await?;

        info!(chore_id, user_id = %user.id, "user joined chore");
        self.publish(&ChoreEvent::UserJoined {
            chore_id: chore_id.to_string(),
            chore: chore.clone(),
            person,
        })
        .await?;
        Ok(chore)
    }

    /// Enroll a person, either free-text or by resolving an email to an
    /// existing account.
    pub async fn add_person(
        &self,
        actor_id: &str,
        chore_id: &str,
        by: AddPersonBy,
    ) -> Result<Chore, RotaError> {
        let mut chore = self.load(chore_id).await?;
        if !access::can_mutate(&chore, actor_id, StructuralOp::AddPerson) {
            return Err(RotaError::Forbidden("No access to this chore".into()));
        }

        let person = match by {
            AddPersonBy::Name(name) => chore.add_person(&name, None)?,
            AddPersonBy::Email(email) => {
                let user = self
                    .users
                    .get_by_email(&email)
                    .await?
                    .ok_or_else(|| RotaError::NotFound("No account with that email".into()))?;
                let person = chore.add_person(&user.name, Some(user.id.clone()))?;
                chore.share_with(&user.id);
                person
            }
        };

        self.chores.save(&chore).await?;
        if let Some(user_id) = &person.user_id {
            self.track_membership(user_id, chore_id).await?;
        }

        info!(chore_id, person_id = %person.id, "person added");
        self.publish(&ChoreEvent::PersonAdded {
            chore_id: chore_id.to_string(),
            chore: chore.clone(),
            person,
        })
        .await?;
        Ok(chore)
    }

    /// Remove a rotation slot. Owners may remove anyone but themselves;
    /// members may remove their own slot.
    pub async fn remove_person(
        &self,
        actor_id: &str,
        chore_id: &str,
        person_id: &str,
    ) -> Result<Chore, RotaError> {
        let mut chore = self.load(chore_id).await?;
        if !access::can_mutate(&chore, actor_id, StructuralOp::RemovePerson { person_id }) {
            return Err(RotaError::Forbidden(
                "Only the owner may remove other people".into(),
            ));
        }

        let removed = chore.remove_person(person_id)?;
        if let Some(user_id) = &removed.user_id {
            chore.unshare(user_id);
        }
        self.chores.save(&chore).await?;
        if let Some(user_id) = &removed.user_id {
            self.untrack_membership(user_id, chore_id).await?;
        }

        info!(chore_id, person_id, "person removed");
        let event = match removed.user_id.as_deref() {
            Some(uid) if uid == actor_id => ChoreEvent::UserLeft {
                chore_id: chore_id.to_string(),
                chore: chore.clone(),
                removed_person: removed,
            },
            Some(_) => ChoreEvent::UserRemoved {
                chore_id: chore_id.to_string(),
                chore: chore.clone(),
                removed_person: removed,
            },
            None => ChoreEvent::PersonRemoved {
                chore_id: chore_id.to_string(),
                chore: chore.clone(),
                removed_person: removed,
            },
        };
        self.publish(&event).await?;
        Ok(chore)
    }

    /// Move the rotation to the next person.
    pub async fn advance(&self, actor_id: &str, chore_id: &str) -> Result<Chore, RotaError> {
        let mut chore = self.load(chore_id).await?;
        if !access::can_mutate(&chore, actor_id, StructuralOp::Advance) {
            return Err(RotaError::Forbidden("No access to this chore".into()));
        }

        let next = chore.advance()?.clone();
        self.chores.save(&chore).await?;

        info!(chore_id, next_person = %next.name, "queue advanced");
        self.publish(&ChoreEvent::QueueAdvanced {
            chore_id: chore_id.to_string(),
            chore: chore.clone(),
            new_current_person: next,
        })
        .await?;
        Ok(chore)
    }

    /// Delete a chore. Owner only.
    pub async fn delete_chore(&self, actor_id: &str, chore_id: &str) -> Result<(), RotaError> {
        let chore = self.load(chore_id).await?;
        if !access::can_mutate(&chore, actor_id, StructuralOp::Delete) {
            return Err(RotaError::Forbidden(
                "Only the owner may delete a chore".into(),
            ));
        }

        for user_id in access::audience_for(&chore) {
            self.untrack_membership(&user_id, chore_id).await?;
        }
        self.chores.delete(chore_id).await?;

        info!(chore_id, "chore deleted");
        self.publish(&ChoreEvent::ChoreDeleted {
            chore_id: chore_id.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn load(&self, chore_id: &str) -> Result<Chore, RotaError> {
        self.chores
            .get(chore_id)
            .await?
            .ok_or_else(|| RotaError::NotFound("Chore not found".into()))
    }

    async fn publish(&self, event: &ChoreEvent) -> Result<(), RotaError> {
        let payload = serde_json::to_vec(event).map_err(anyhow::Error::from)?;
        self.store.publish(CHORE_UPDATES_CHANNEL, &payload).await?;
        Ok(())
    }

    /// Record `chore_id` in the user's membership index, if the user exists.
    async fn track_membership(&self, user_id: &str, chore_id: &str) -> Result<(), RotaError> {
        if let Some(mut user) = self.users.get(user_id).await? {
            if !user.chore_ids.iter().any(|id| id == chore_id) {
                user.chore_ids.push(chore_id.to_string());
                self.users.save(&user).await?;
            }
        }
        Ok(())
    }

    async fn untrack_membership(&self, user_id: &str, chore_id: &str) -> Result<(), RotaError> {
        if let Some(mut user) = self.users.get(user_id).await? {
            if user.chore_ids.iter().any(|id| id == chore_id) {
                user.chore_ids.retain(|id| id != chore_id);
                self.users.save(&user).await?;
            }
        }
        Ok(())
    }
}
