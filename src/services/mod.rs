mod events;
mod kv;
mod telegram;
mod user;

pub use self::{
    events::{log_events, Event, EventBus},
    kv::{KvService, KvServiceError},
    telegram::TelegramHost,
    user::{UserInfo, UserService, UserServiceError},
};
