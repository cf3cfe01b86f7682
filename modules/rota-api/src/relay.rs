//! Fanout relay: the one consumer of the `chore_updates` channel.
//!
//! For every published event it resolves the audience against the latest
//! persisted chore and pushes the raw payload to each of their live
//! connections. Delivery is best-effort per connection: a dead connection
//! is pruned and the rest of the audience still gets the event. Events
//! whose chore no longer exists are dropped, never broadcast.

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use tracing::{debug, info, warn};

use rota_core::access;
use rota_core::{ChoreEvent, ChoreRepo, CHORE_UPDATES_CHANNEL};
use rota_store::Store;

use crate::registry::ConnectionRegistry;

pub struct FanoutRelay {
    store: Arc<dyn Store>,
    chores: ChoreRepo,
    registry: Arc<ConnectionRegistry>,
}

impl FanoutRelay {
    pub fn new(store: Arc<dyn Store>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            chores: ChoreRepo::new(store.clone()),
            store,
            registry,
        }
    }

    /// Subscribe and spawn the delivery loop. Returns once the subscription
    /// is live, so events published afterwards are guaranteed to be seen.
    /// Abort the handle to stop the relay.
    pub async fn spawn(self) -> Result<tokio::task::JoinHandle<()>> {
        let mut events = self.store.subscribe(CHORE_UPDATES_CHANNEL).await?;
        info!(channel = CHORE_UPDATES_CHANNEL, "fanout relay subscribed");

        Ok(tokio::spawn(async move {
            while let Some(payload) = events.next().await {
                self.dispatch(&payload).await;
            }
            warn!("fanout relay stream ended");
        }))
    }

    async fn dispatch(&self, payload: &[u8]) {
        let event: ChoreEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "dropping undecodable event payload");
                return;
            }
        };

        // Audience comes from the latest persisted state, never the event.
        let chore = match self.chores.get(event.chore_id()).await {
            Ok(Some(chore)) => chore,
            Ok(None) => {
                debug!(chore_id = event.chore_id(), "dropping event for missing chore");
                return;
            }
            Err(e) => {
                warn!(error = %e, chore_id = event.chore_id(), "dropping event, chore load failed");
                return;
            }
        };

        let text = match std::str::from_utf8(payload) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "dropping non-utf8 event payload");
                return;
            }
        };

        for user_id in access::audience_for(&chore) {
            for conn in self.registry.connections_for(&user_id) {
                if conn.send(text).is_err() {
                    self.registry.deregister(conn.id);
                    debug!(%user_id, conn_id = %conn.id, "pruned dead connection");
                }
            }
        }
    }
}
