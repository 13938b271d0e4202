//! Pending message-box acknowledgements.
//!
//! A `message_box` step registers a oneshot sender keyed by execution id and
//! waits on the receiver. The acknowledgement signal from the event channel
//! fires the sender.

use dashmap::DashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MessageBoxRegistry {
    pending: DashMap<Uuid, oneshot::Sender<()>>,
}

impl MessageBoxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending box for `execution_id`, replacing any earlier one.
    pub fn register(&self, execution_id: Uuid) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(execution_id, tx);
        rx
    }

    /// Acknowledge the pending box. Returns `false` when none is pending.
    pub fn acknowledge(&self, execution_id: Uuid) -> bool {
        match self.pending.remove(&execution_id) {
            Some((_, tx)) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Forget the pending box without acknowledging it.
    pub fn discard(&self, execution_id: Uuid) {
        self.pending.remove(&execution_id);
    }

    pub fn is_pending(&self, execution_id: Uuid) -> bool {
        self.pending.contains_key(&execution_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acknowledge_wakes_the_waiter() {
        let registry = MessageBoxRegistry::new();
        let id = Uuid::now_v7();
        let rx = registry.register(id);
        assert!(registry.is_pending(id));
        assert!(registry.acknowledge(id));
        assert!(rx.await.is_ok());
        assert!(!registry.is_pending(id));
    }

    #[test]
    fn acknowledge_without_pending_box_is_false() {
        let registry = MessageBoxRegistry::new();
        assert!(!registry.acknowledge(Uuid::now_v7()));
    }

    #[tokio::test]
    async fn discard_drops_the_sender() {
        let registry = MessageBoxRegistry::new();
        let id = Uuid::now_v7();
        let rx = registry.register(id);
        registry.discard(id);
        assert!(rx.await.is_err());
        assert!(!registry.acknowledge(id));
    }
}
