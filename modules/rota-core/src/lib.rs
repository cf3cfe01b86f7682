//! Chore domain: the rotation aggregate, access rules, domain events,
//! and the command handlers that tie them to a [`rota_store::Store`].

pub mod access;
pub mod chore;
pub mod commands;
pub mod events;
pub mod repo;
pub mod users;

pub use chore::{Chore, ChoreError, Person};
pub use commands::{AddPersonBy, ChoreService};
pub use events::{ChoreEvent, CHORE_UPDATES_CHANNEL};
pub use repo::ChoreRepo;
pub use users::{User, UserRepo};
