use crate::host::{Broadcast, CommandSpec, Host, HostError, User};
use futures_util::future::{self, BoxFuture};
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// In-process host keeping users, key/value pairs and published events in memory.
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    kv: HashMap<String, Vec<u8>>,
    events: Vec<PublishedEvent>,
    commands: Vec<CommandSpec>,
    fail_reads: bool,
    fail_writes: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PublishedEvent {
    pub name: String,
    pub payload: Value,
    pub broadcast: Broadcast,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user<I, N>(self, id: I, username: N) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        self.add_user(User::new(id, username));
        self
    }

    pub fn add_user(&self, user: User) {
        self.lock().users.push(user);
    }

    pub fn remove_user(&self, user_id: &str) {
        self.lock().users.retain(|user| user.id != user_id);
    }

    pub fn rename_user(&self, user_id: &str, username: &str) {
        if let Some(user) = self.lock().users.iter_mut().find(|user| user.id == user_id) {
            user.username = username.to_string();
        }
    }

    pub fn put_raw<K: Into<String>>(&self, key: K, value: Vec<u8>) {
        self.lock().kv.insert(key.into(), value);
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().kv.get(key).cloned()
    }

    pub fn events(&self) -> Vec<PublishedEvent> {
        self.lock().events.clone()
    }

    pub fn take_events(&self) -> Vec<PublishedEvent> {
        std::mem::take(&mut self.lock().events)
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.lock().commands.clone()
    }

    pub fn fail_reads(&self, value: bool) {
        self.lock().fail_reads = value;
    }

    pub fn fail_writes(&self, value: bool) {
        self.lock().fail_writes = value;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_user<P>(&self, predicate: P) -> Option<User>
    where
        P: Fn(&User) -> bool,
    {
        self.lock().users.iter().find(|user| predicate(user)).cloned()
    }
}

impl Host for MemoryHost {
    fn get_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<User, HostError>> {
        let result = self
            .find_user(|user| user.id == user_id)
            .ok_or_else(|| HostError::UserNotFound(user_id.to_string()));
        Box::pin(future::ready(result))
    }

    fn get_user_by_username<'a>(&'a self, username: &'a str) -> BoxFuture<'a, Result<User, HostError>> {
        let result = self
            .find_user(|user| user.username == username)
            .ok_or_else(|| HostError::UsernameNotFound(username.to_string()));
        Box::pin(future::ready(result))
    }

    fn get_users_by_usernames<'a>(&'a self, usernames: &'a [String]) -> BoxFuture<'a, Result<Vec<User>, HostError>> {
        let users = usernames
            .iter()
            .filter_map(|username| self.find_user(|user| &user.username == username))
            .collect();
        Box::pin(future::ready(Ok(users)))
    }

    fn kv_get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, HostError>> {
        let state = self.lock();
        let result = if state.fail_reads {
            Err(HostError::Storage(Box::new(InjectedFailure("read"))))
        } else {
            Ok(state.kv.get(key).cloned())
        };
        Box::pin(future::ready(result))
    }

    fn kv_set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> BoxFuture<'a, Result<(), HostError>> {
        let mut state = self.lock();
        let result = if state.fail_writes {
            Err(HostError::Storage(Box::new(InjectedFailure("write"))))
        } else {
            state.kv.insert(key.to_string(), value);
            Ok(())
        };
        Box::pin(future::ready(result))
    }

    fn publish(&self, event: &str, payload: Value, broadcast: Broadcast) {
        self.lock().events.push(PublishedEvent {
            name: event.to_string(),
            payload,
            broadcast,
        });
    }

    fn register_command(&self, command: CommandSpec) -> BoxFuture<'_, Result<(), HostError>> {
        self.lock().commands.push(command);
        Box::pin(future::ready(Ok(())))
    }
}

#[derive(Debug)]
struct InjectedFailure(&'static str);

impl fmt::Display for InjectedFailure {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "{} failure injected", self.0)
    }
}

impl std::error::Error for InjectedFailure {}
