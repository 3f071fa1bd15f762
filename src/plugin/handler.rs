use crate::{config::PluginSettings, host::Host, plugin::store::SilencerStore};
use std::fmt::Write;

const MESSAGE_NO_SILENCED: &str = "###### You have no silenced users\n";
const MESSAGE_LIST_HEADER: &str = "###### Users you've silenced:\n";
const MESSAGE_LIST_FAILED: &str = "Unable to fetch silencer list";
const MESSAGE_CLEARED: &str = "List cleared";
const MESSAGE_NO_SENDER: &str = "Cannot get user";
const MESSAGE_NO_TARGET: &str = "Cannot get the other user";

pub fn help_text(trigger: &str) -> String {
    format!(
        "###### User Silencer\n\
         - `/{trigger}` - Show a list of currently silenced users.\n\
         - `/{trigger} @user` - Toggle silencing user by name.\n\
         - `/{trigger} clear` - Clear the list of silenced users.\n\
         - `/{trigger} help` - Show this help text.",
        trigger = trigger
    )
}

pub fn unknown_command_text(input: &str) -> String {
    format!("Unknown command: {}", input)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Subcommand {
    List,
    Help,
    Clear,
    Toggle(String),
    Unknown(String),
}

impl Subcommand {
    /// Interprets the first token after the trigger.
    pub fn parse(token: Option<&str>) -> Self {
        match token {
            None => Subcommand::List,
            Some("help") => Subcommand::Help,
            Some("clear") => Subcommand::Clear,
            Some(token) => match token.strip_prefix('@') {
                Some(username) => Subcommand::Toggle(username.to_string()),
                None => Subcommand::Unknown(token.to_string()),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggled {
    Silenced,
    Allowed,
}

/// Removes the first entry equal to `username`, or appends it when absent.
pub fn toggle(list: &mut Vec<String>, username: &str) -> Toggled {
    match list.iter().position(|item| item == username) {
        Some(idx) => {
            list.remove(idx);
            Toggled::Allowed
        }
        None => {
            list.push(username.to_string());
            Toggled::Silenced
        }
    }
}

/// Runs a parsed subcommand for its owner and renders the reply.
///
/// Every failure ends up as reply text; nothing is returned as an error.
#[derive(Clone)]
pub struct CommandHandler<H> {
    host: H,
    store: SilencerStore<H>,
}

impl<H: Host> CommandHandler<H> {
    pub fn new(host: H) -> Self {
        let store = SilencerStore::new(host.clone());
        Self { host, store }
    }

    pub fn store(&self) -> &SilencerStore<H> {
        &self.store
    }

    pub async fn execute(&self, owner: &str, subcommand: &Subcommand, settings: &PluginSettings) -> String {
        match subcommand {
            Subcommand::List => self.handle_list(owner, settings).await,
            Subcommand::Help => help_text(&settings.trigger),
            Subcommand::Clear => self.handle_clear(owner).await,
            Subcommand::Toggle(username) => self.handle_toggle(owner, username, settings).await,
            Subcommand::Unknown(token) => unknown_command_text(token),
        }
    }

    async fn handle_list(&self, owner: &str, settings: &PluginSettings) -> String {
        let list = match self.store.read(owner, settings.notify_on_read).await {
            Ok(list) => list,
            Err(err) => {
                log::error!("Could not read block list of {}: {}", owner, err);
                Vec::new()
            }
        };
        if list.is_empty() {
            return String::from(MESSAGE_NO_SILENCED);
        }
        let users = match self.host.get_users_by_usernames(&list).await {
            Ok(users) => users,
            Err(err) => {
                log::error!("Unable to get users in list: {}", err);
                return String::from(MESSAGE_LIST_FAILED);
            }
        };
        if users.len() < list.len() {
            log::warn!(
                "{} of {} silenced usernames no longer resolve for {}",
                list.len() - users.len(),
                list.len(),
                owner
            );
        }
        let mut result = String::from(MESSAGE_LIST_HEADER);
        for user in users {
            let _ = writeln!(result, "@{}", user.username);
        }
        result
    }

    async fn handle_clear(&self, owner: &str) -> String {
        match self.store.write(owner, &[]).await {
            Ok(()) => String::from(MESSAGE_CLEARED),
            Err(err) => {
                log::error!("Could not clear block list of {}: {}", owner, err);
                err.to_string()
            }
        }
    }

    async fn handle_toggle(&self, owner: &str, username: &str, settings: &PluginSettings) -> String {
        let sender = match self.host.get_user(owner).await {
            Ok(user) => user,
            Err(err) => {
                log::error!("Unable to get user: {}", err);
                return String::from(MESSAGE_NO_SENDER);
            }
        };
        let target = match self.host.get_user_by_username(username).await {
            Ok(user) => user,
            Err(err) => {
                log::error!("Unable to get user by username: {}", err);
                return String::from(MESSAGE_NO_TARGET);
            }
        };
        let mut list = match self.store.read(owner, settings.notify_on_read).await {
            Ok(list) => list,
            Err(err) => {
                log::error!("Could not read block list of {}: {}", owner, err);
                return err.to_string();
            }
        };
        let toggled = toggle(&mut list, &target.username);
        if let Err(err) = self.store.write(owner, &list).await {
            log::error!("Could not save block list of {}: {}", owner, err);
            return err.to_string();
        }
        match toggled {
            Toggled::Silenced => format!("@{} asked @{} to be quiet", sender.username, target.username),
            Toggled::Allowed => format!("@{} allowed @{} to speak", sender.username, target.username),
        }
    }
}
