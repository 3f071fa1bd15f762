use crate::{
    host::{Broadcast, CommandSpec, Host, HostError, User},
    services::{Event, EventBus, KvService, UserInfo, UserService},
};
use carapax::{
    methods::SetMyCommands,
    types::{BotCommand, Integer},
    Api,
};
use futures_util::future::BoxFuture;
use serde_json::Value;

/// Host backed by the Telegram Bot API, PostgreSQL and an in-process event bus.
#[derive(Clone)]
pub struct TelegramHost {
    api: Api,
    users: UserService,
    kv: KvService,
    events: EventBus,
}

impl TelegramHost {
    pub fn new(api: Api, users: UserService, kv: KvService, events: EventBus) -> Self {
        Self { api, users, kv, events }
    }
}

fn into_user(info: UserInfo) -> Result<User, HostError> {
    match info.username {
        Some(username) => Ok(User::new(info.id.to_string(), username)),
        None => Err(HostError::NoUsername(info.id.to_string())),
    }
}

impl Host for TelegramHost {
    fn get_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<User, HostError>> {
        Box::pin(async move {
            let id: Integer = user_id
                .parse()
                .map_err(|_| HostError::UserNotFound(user_id.to_string()))?;
            let info = self
                .users
                .find(id)
                .await
                .map_err(|err| HostError::Storage(Box::new(err)))?
                .ok_or_else(|| HostError::UserNotFound(user_id.to_string()))?;
            into_user(info)
        })
    }

    fn get_user_by_username<'a>(&'a self, username: &'a str) -> BoxFuture<'a, Result<User, HostError>> {
        Box::pin(async move {
            let info = self
                .users
                .find_by_username(username)
                .await
                .map_err(|err| HostError::Storage(Box::new(err)))?
                .ok_or_else(|| HostError::UsernameNotFound(username.to_string()))?;
            into_user(info)
        })
    }

    fn get_users_by_usernames<'a>(&'a self, usernames: &'a [String]) -> BoxFuture<'a, Result<Vec<User>, HostError>> {
        Box::pin(async move {
            let users = self
                .users
                .find_by_usernames(usernames)
                .await
                .map_err(|err| HostError::Storage(Box::new(err)))?
                .into_iter()
                .filter_map(|info| into_user(info).ok())
                .collect();
            Ok(users)
        })
    }

    fn kv_get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, HostError>> {
        Box::pin(async move { self.kv.get(key).await.map_err(|err| HostError::Storage(Box::new(err))) })
    }

    fn kv_set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> BoxFuture<'a, Result<(), HostError>> {
        Box::pin(async move {
            self.kv
                .set(key, &value)
                .await
                .map_err(|err| HostError::Storage(Box::new(err)))
        })
    }

    fn publish(&self, event: &str, payload: Value, broadcast: Broadcast) {
        self.events.publish(Event {
            name: event.to_string(),
            payload,
            broadcast,
        });
    }

    fn register_command(&self, command: CommandSpec) -> BoxFuture<'_, Result<(), HostError>> {
        Box::pin(async move {
            if !command.auto_complete {
                return Ok(());
            }
            let bot_command = BotCommand::new(command.trigger, command.auto_complete_desc)
                .map_err(|err| HostError::Registration(Box::new(err)))?;
            self.api
                .execute(SetMyCommands::new(vec![bot_command]))
                .await
                .map_err(|err| HostError::Registration(Box::new(err)))?;
            Ok(())
        })
    }
}
