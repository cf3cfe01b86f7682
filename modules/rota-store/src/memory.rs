//! In-memory store for tests and single-process dev runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream;
use tokio::sync::mpsc;

use crate::store::{ByteStream, Store};

/// `Store` backed by process memory. The data map is a `BTreeMap` so
/// `scan_prefix` comes back in key order, matching the Postgres backend.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<String, Vec<u8>>>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Vec<u8>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.data.lock().unwrap().remove(key).is_some())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<()> {
        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(senders) = subscribers.get_mut(channel) {
            // Closed receivers are subscribers that went away; drop them here.
            senders.retain(|tx| tx.send(payload.to_vec()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<ByteStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap()
            .entry(channel.to_string())
            .or_default()
            .push(tx);

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|payload| (payload, rx))
        });
        Ok(Box::pin(stream))
    }
}
