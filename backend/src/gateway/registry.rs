use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};

use super::protocol::ServerEvent;

pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Live connections of this process, keyed by connection handle
#[derive(Debug, Default)]
pub struct SessionRegistry {
    connections: RwLock<HashMap<String, Outbox>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, entry_id: &str, outbox: Outbox) {
        self.connections
            .write()
            .await
            .insert(entry_id.to_string(), outbox);
    }

    pub async fn unregister(&self, entry_id: &str) {
        self.connections.write().await.remove(entry_id);
    }

    /// Returns false if the connection is not on this process or already closed
    pub async fn send(&self, entry_id: &str, event: ServerEvent) -> bool {
        match self.connections.read().await.get(entry_id) {
            Some(outbox) => outbox.send(event).is_ok(),
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_reaches_registered_connection() {
        let registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register("conn-1", tx).await;

        assert!(registry.send("conn-1", ServerEvent::error("hi")).await);
        assert_eq!(rx.recv().await, Some(ServerEvent::error("hi")));
    }

    #[tokio::test]
    async fn test_send_to_unknown_or_closed_fails() {
        let registry = SessionRegistry::new();
        assert!(!registry.send("nobody", ServerEvent::error("hi")).await);

        let (tx, rx) = mpsc::unbounded_channel();
        registry.register("conn-1", tx).await;
        drop(rx);
        assert!(!registry.send("conn-1", ServerEvent::error("hi")).await);

        registry.unregister("conn-1").await;
        assert!(registry.is_empty().await);
    }
}
