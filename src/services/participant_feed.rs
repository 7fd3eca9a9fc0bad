use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::CheckInDay;
use crate::services::participant_service::ParticipantView;

const FEED_CAPACITY: usize = 256;

/// A change to some event's participant list, pushed to open admin pages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParticipantChange {
    Registered {
        event_id: String,
        participant: ParticipantView,
    },
    Removed {
        event_id: String,
        registration_id: String,
    },
    CheckedIn {
        user_id: String,
        day: CheckInDay,
    },
}

impl ParticipantChange {
    /// Check-ins are not tied to one event, so every list cares about them.
    pub fn concerns(&self, event_id: &str) -> bool {
        match self {
            ParticipantChange::Registered { event_id: e, .. }
            | ParticipantChange::Removed { event_id: e, .. } => e == event_id,
            ParticipantChange::CheckedIn { .. } => true,
        }
    }
}

#[derive(Clone)]
pub struct ParticipantFeed {
    tx: broadcast::Sender<ParticipantChange>,
}

impl ParticipantFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, change: ParticipantChange) {
        // No subscribers is the normal case when no admin has the page open.
        if self.tx.send(change).is_err() {
            debug!("Participant change dropped, nobody listening");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ParticipantChange> {
        self.tx.subscribe()
    }
}

impl Default for ParticipantFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_changes() {
        let feed = ParticipantFeed::new();
        let mut rx = feed.subscribe();
        feed.publish(ParticipantChange::Removed {
            event_id: "e1".into(),
            registration_id: "r1".into(),
        });

        let change = rx.recv().await.unwrap();
        assert!(change.concerns("e1"));
        assert!(!change.concerns("e2"));

        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["type"], "removed");
        assert_eq!(json["registration_id"], "r1");
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let feed = ParticipantFeed::new();
        feed.publish(ParticipantChange::CheckedIn {
            user_id: "u1".into(),
            day: CheckInDay::Two,
        });
    }
}
