//! Per-user mute list for a Telegram bot.
//!
//! Users send `/silencer @name` to toggle whether they want to hear from
//! `name`; the list is kept per user in PostgreSQL and every change is
//! published to the user's clients as a `silencer_list_changed` event.

mod app;
pub mod config;
mod handlers;
pub mod host;
mod migrations;
pub mod plugin;
pub mod services;

pub use self::app::{run, AppError};
