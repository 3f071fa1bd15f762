use crate::host::Broadcast;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError, Receiver, Sender};

#[derive(Clone, Debug)]
pub struct Event {
    pub name: String,
    pub payload: Value,
    pub broadcast: Broadcast,
}

/// In-process pub/sub; events published with no subscriber are dropped.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns the number of subscribers that got the event.
    pub fn publish(&self, event: Event) -> usize {
        match self.sender.send(event) {
            Ok(count) => count,
            Err(err) => {
                log::debug!("Dropped {} event: no subscribers", err.0.name);
                0
            }
        }
    }

    pub fn subscribe(&self) -> Receiver<Event> {
        self.sender.subscribe()
    }
}

/// Logs every event until the bus is closed.
pub async fn log_events(mut receiver: Receiver<Event>) {
    loop {
        match receiver.recv().await {
            Ok(event) => match event.broadcast.user_id {
                Some(ref user_id) => log::debug!("{} for user {}: {}", event.name, user_id, event.payload),
                None => log::debug!("{} for everyone: {}", event.name, event.payload),
            },
            Err(RecvError::Lagged(count)) => log::warn!("Event log lagged behind by {} events", count),
            Err(RecvError::Closed) => break,
        }
    }
}
