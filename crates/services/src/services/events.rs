//! In-process change feed: notify-and-pull realtime updates.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tokio::sync::broadcast;
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
}

/// A row changed. Subscribers are expected to refetch; no ordering guarantee
/// between the event and the subsequent read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct ChangeEvent {
    pub table: String,
    pub op: ChangeOp,
    pub row_id: Uuid,
}

#[derive(Clone)]
pub struct EventService {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for EventService {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventService {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, table: &str, op: ChangeOp, row_id: Uuid) {
        let event = ChangeEvent {
            table: table.to_string(),
            op,
            row_id,
        };
        debug!(table = %event.table, op = %event.op, row_id = %row_id, "change event");
        // A send error only means nobody is listening right now.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let events = EventService::new(8);
        let mut rx = events.subscribe();
        let id = Uuid::new_v4();

        events.publish("maintenance_tickets", ChangeOp::Update, id);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, "maintenance_tickets");
        assert_eq!(event.op, ChangeOp::Update);
        assert_eq!(event.row_id, id);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_panic() {
        let events = EventService::new(8);
        events.publish("payments", ChangeOp::Insert, Uuid::new_v4());
    }
}
