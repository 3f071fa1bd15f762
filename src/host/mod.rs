//! Capabilities the silencer plugin consumes from whatever process hosts it.
//!
//! The plugin never talks to a database, a chat API or a socket directly.
//! Everything goes through [`Host`], so the same core runs inside the Telegram
//! bot ([`crate::services::TelegramHost`]) and against [`MemoryHost`] in tests.

use futures_util::future::BoxFuture;
use serde_json::Value;
use std::{error::Error, fmt};

mod memory;

pub use self::memory::{MemoryHost, PublishedEvent};

/// A user record from the host directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
}

impl User {
    pub fn new<I, N>(id: I, username: N) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

/// A slash command declared to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub trigger: String,
    pub auto_complete: bool,
    pub auto_complete_desc: String,
}

/// Audience of a published event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Broadcast {
    /// Deliver only to sessions of this user; `None` means everyone.
    pub user_id: Option<String>,
}

impl Broadcast {
    pub fn user<I: Into<String>>(user_id: I) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }
}

pub trait Host: Clone + Send + Sync + 'static {
    fn get_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<User, HostError>>;

    fn get_user_by_username<'a>(&'a self, username: &'a str) -> BoxFuture<'a, Result<User, HostError>>;

    /// Users matching `usernames`; names that do not resolve are left out.
    fn get_users_by_usernames<'a>(&'a self, usernames: &'a [String]) -> BoxFuture<'a, Result<Vec<User>, HostError>>;

    /// `Ok(None)` when nothing is stored under `key`.
    fn kv_get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, HostError>>;

    fn kv_set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> BoxFuture<'a, Result<(), HostError>>;

    /// Best effort; delivery failures are the host's business.
    fn publish(&self, event: &str, payload: Value, broadcast: Broadcast);

    fn register_command(&self, command: CommandSpec) -> BoxFuture<'_, Result<(), HostError>>;
}

pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug)]
pub enum HostError {
    NoUsername(String),
    Registration(BoxError),
    Storage(BoxError),
    UserNotFound(String),
    UsernameNotFound(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::HostError::*;
        match self {
            NoUsername(user_id) => write!(out, "user {} has no username", user_id),
            Registration(err) => write!(out, "could not register command: {}", err),
            Storage(err) => write!(out, "storage error: {}", err),
            UserNotFound(user_id) => write!(out, "user with id {} not found", user_id),
            UsernameNotFound(username) => write!(out, "user @{} not found", username),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use self::HostError::*;
        match self {
            Registration(err) => Some(err.as_ref()),
            Storage(err) => Some(err.as_ref()),
            NoUsername(_) | UserNotFound(_) | UsernameNotFound(_) => None,
        }
    }
}
