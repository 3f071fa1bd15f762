//! The silencer command: a per-user list of usernames the owner wants to mute.
//!
//! Filtering messages is up to the clients receiving `silencer_list_changed`.

mod handler;
mod notify;
mod router;
mod store;

pub use self::{
    handler::{help_text, toggle, CommandHandler, Subcommand, Toggled},
    notify::{NotificationPublisher, LIST_CHANGED_EVENT},
    router::{ActivateError, CommandResponse, CommandRouter},
    store::{BlockListKey, SilencerStore, StoreError},
};
