//! User records and their store layout.
//!
//! The full record lives under both `user:{id}` and `user_email:{email}`,
//! so id and email lookups are both single gets.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rota_store::Store;

pub fn user_key(user_id: &str) -> String {
    format!("user:{user_id}")
}

pub fn user_email_key(email: &str) -> String {
    format!("user_email:{}", email.to_lowercase())
}

/// A registered account. Credentials live with the auth layer, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Denormalized membership index, kept in sync by the command handlers.
    #[serde(default)]
    pub chore_ids: Vec<String>,
}

impl User {
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_lowercase(),
            name: name.to_string(),
            chore_ids: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct UserRepo {
    store: Arc<dyn Store>,
}

impl UserRepo {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<User>> {
        match self.store.get(&user_key(user_id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.store.get(&user_email_key(email)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write the record under both lookup keys.
    pub async fn save(&self, user: &User) -> Result<()> {
        let bytes = serde_json::to_vec(user)?;
        self.store.set(&user_key(&user.id), &bytes).await?;
        self.store.set(&user_email_key(&user.email), &bytes).await
    }
}
