//! The chore aggregate: an ordered rotation of people plus a cursor.
//!
//! All structural mutations go through the methods here; each one either
//! fails with a [`ChoreError`] or leaves `current_person_index` pointing at
//! a live slot (or 0 on an empty rotation).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use rota_common::RotaError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChoreError {
    #[error("A person with this name is already in the rotation")]
    DuplicateName,

    #[error("This user is already in the rotation")]
    AlreadyMember,

    #[error("No person with id {0} in this chore")]
    PersonNotFound(String),

    #[error("The rotation has no people")]
    EmptyQueue,
}

impl From<ChoreError> for RotaError {
    fn from(e: ChoreError) -> Self {
        match e {
            ChoreError::PersonNotFound(_) => RotaError::NotFound(e.to_string()),
            ChoreError::DuplicateName | ChoreError::AlreadyMember | ChoreError::EmptyQueue => {
                RotaError::InvalidState(e.to_string())
            }
        }
    }
}

/// One slot in a chore's rotation order. `user_id` is present iff the slot
/// belongs to a registered account rather than a free-text name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Person {
    fn new(name: &str, user_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            user_id,
        }
    }
}

/// A named rotating task queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chore {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    /// User ids granted access, excluding the owner. Kept in lockstep with
    /// registered entries in `people` by the command handlers.
    #[serde(default)]
    pub shared_with: Vec<String>,
    /// Turn order.
    #[serde(default)]
    pub people: Vec<Person>,
    /// Index of whoever's turn it is. 0 when `people` is empty.
    #[serde(default)]
    pub current_person_index: usize,
}

impl Chore {
    /// Create a chore with the owner enrolled as the first person.
    pub fn new(name: &str, owner_id: &str, owner_name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            shared_with: Vec::new(),
            people: vec![Person::new(owner_name, Some(owner_id.to_string()))],
            current_person_index: 0,
        }
    }

    /// Whoever's turn it is, if anyone is enrolled.
    pub fn current_person(&self) -> Option<&Person> {
        self.people.get(self.current_person_index)
    }

    /// The rotation slot backed by this user account, if any.
    pub fn person_for_user(&self, user_id: &str) -> Option<&Person> {
        self.people
            .iter()
            .find(|p| p.user_id.as_deref() == Some(user_id))
    }

    /// Grant a user access. No-op for the owner or an already-shared user.
    pub fn share_with(&mut self, user_id: &str) {
        if user_id != self.owner_id && !self.shared_with.iter().any(|id| id == user_id) {
            self.shared_with.push(user_id.to_string());
        }
    }

    /// Revoke a user's shared access, if present.
    pub fn unshare(&mut self, user_id: &str) {
        self.shared_with.retain(|id| id != user_id);
    }

    /// Append a person to the end of the rotation. The cursor is unchanged.
    pub fn add_person(
        &mut self,
        name: &str,
        user_id: Option<String>,
    ) -> Result<Person, ChoreError> {
        match &user_id {
            Some(uid) => {
                if self.person_for_user(uid).is_some() {
                    return Err(ChoreError::AlreadyMember);
                }
            }
            None => {
                let lowered = name.to_lowercase();
                if self.people.iter().any(|p| p.name.to_lowercase() == lowered) {
                    return Err(ChoreError::DuplicateName);
                }
            }
        }

        let person = Person::new(name, user_id);
        self.people.push(person.clone());
        Ok(person)
    }

    /// Remove a person and rebalance the cursor so it keeps pointing at the
    /// same logical "current" person when someone before or at that slot
    /// leaves, without ever going out of range.
    pub fn remove_person(&mut self, person_id: &str) -> Result<Person, ChoreError> {
        let position = self
            .people
            .iter()
            .position(|p| p.id == person_id)
            .ok_or_else(|| ChoreError::PersonNotFound(person_id.to_string()))?;
        let removed = self.people.remove(position);

        if self.people.is_empty() {
            self.current_person_index = 0;
        } else if position <= self.current_person_index {
            if self.current_person_index > 0 {
                self.current_person_index -= 1;
            } else if self.current_person_index >= self.people.len() {
                self.current_person_index = 0;
            }
        }

        Ok(removed)
    }

    /// Move the cursor to the next person, wrapping around unconditionally.
    pub fn advance(&mut self) -> Result<&Person, ChoreError> {
        if self.people.is_empty() {
            return Err(ChoreError::EmptyQueue);
        }
        self.current_person_index = (self.current_person_index + 1) % self.people.len();
        Ok(&self.people[self.current_person_index])
    }
}
