use crate::host::{Broadcast, Host};
use serde_json::json;

pub const LIST_CHANGED_EVENT: &str = "silencer_list_changed";

/// Pushes the current block list to the owner's connected clients.
#[derive(Clone)]
pub struct NotificationPublisher<H> {
    host: H,
}

impl<H: Host> NotificationPublisher<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn publish(&self, owner: &str, list: &[String]) {
        log::debug!("Publishing {} for {}: {:?}", LIST_CHANGED_EVENT, owner, list);
        self.host
            .publish(LIST_CHANGED_EVENT, json!({ "list": list }), Broadcast::user(owner));
    }
}
