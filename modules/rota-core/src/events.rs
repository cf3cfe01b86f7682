//! Domain events and their wire shape.
//!
//! Every event serializes to a flat JSON object tagged by `type`, e.g.
//! `{"type":"person_added","chore_id":...,"chore":{...},"person":{...}}`.
//! `chore_deleted` carries no chore snapshot; the record is already gone.

use serde::{Deserialize, Serialize};

use crate::chore::{Chore, Person};

/// Pub/sub channel all chore events ride on.
pub const CHORE_UPDATES_CHANNEL: &str = "chore_updates";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChoreEvent {
    ChoreCreated {
        chore_id: String,
        chore: Chore,
    },
    ChoreDeleted {
        chore_id: String,
    },
    /// A person was enrolled by a member (free-text or by email).
    PersonAdded {
        chore_id: String,
        chore: Chore,
        person: Person,
    },
    /// A registered user joined by chore id.
    UserJoined {
        chore_id: String,
        chore: Chore,
        person: Person,
    },
    /// A free-text slot was removed.
    PersonRemoved {
        chore_id: String,
        chore: Chore,
        removed_person: Person,
    },
    /// The owner removed a registered member.
    UserRemoved {
        chore_id: String,
        chore: Chore,
        removed_person: Person,
    },
    /// A member removed their own slot.
    UserLeft {
        chore_id: String,
        chore: Chore,
        removed_person: Person,
    },
    QueueAdvanced {
        chore_id: String,
        chore: Chore,
        new_current_person: Person,
    },
}

impl ChoreEvent {
    pub fn chore_id(&self) -> &str {
        match self {
            ChoreEvent::ChoreCreated { chore_id, .. }
            | ChoreEvent::ChoreDeleted { chore_id }
            | ChoreEvent::PersonAdded { chore_id, .. }
            | ChoreEvent::UserJoined { chore_id, .. }
            | ChoreEvent::PersonRemoved { chore_id, .. }
            | ChoreEvent::UserRemoved { chore_id, .. }
            | ChoreEvent::UserLeft { chore_id, .. }
            | ChoreEvent::QueueAdvanced { chore_id, .. } => chore_id,
        }
    }
}
