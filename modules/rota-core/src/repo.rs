//! Chore persistence over the key-value store.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use rota_store::Store;

use crate::chore::Chore;

const CHORE_KEY_PREFIX: &str = "chore:";

pub fn chore_key(chore_id: &str) -> String {
    format!("{CHORE_KEY_PREFIX}{chore_id}")
}

/// Loads and saves whole chore aggregates as JSON blobs.
#[derive(Clone)]
pub struct ChoreRepo {
    store: Arc<dyn Store>,
}

impl ChoreRepo {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, chore_id: &str) -> Result<Option<Chore>> {
        match self.store.get(&chore_key(chore_id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn save(&self, chore: &Chore) -> Result<()> {
        let bytes = serde_json::to_vec(chore)?;
        self.store.set(&chore_key(&chore.id), &bytes).await
    }

    pub async fn delete(&self, chore_id: &str) -> Result<bool> {
        self.store.delete(&chore_key(chore_id)).await
    }

    /// Every stored chore. Records that no longer decode are skipped.
    pub async fn all(&self) -> Result<Vec<Chore>> {
        let blobs = self.store.scan_prefix(CHORE_KEY_PREFIX).await?;
        let mut chores = Vec::with_capacity(blobs.len());
        for bytes in blobs {
            match serde_json::from_slice(&bytes) {
                Ok(chore) => chores.push(chore),
                Err(e) => warn!(error = %e, "skipping undecodable chore record"),
            }
        }
        Ok(chores)
    }
}
