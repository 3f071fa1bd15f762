use crate::{
    config::{SettingsError, SettingsSlot},
    host::{CommandSpec, Host, HostError},
    plugin::handler::{unknown_command_text, CommandHandler, Subcommand},
};
use std::{error::Error, fmt};

const COMMAND_DESCRIPTION: &str = "Toggles silencing of users.";

/// Reply to a command; always shown to the invoking user only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandResponse {
    pub text: String,
}

impl CommandResponse {
    fn ephemeral<T: Into<String>>(text: T) -> Self {
        Self { text: text.into() }
    }
}

/// Entry point of the plugin: registers the trigger and dispatches raw command text.
#[derive(Clone)]
pub struct CommandRouter<H> {
    host: H,
    settings: SettingsSlot,
    handler: CommandHandler<H>,
}

impl<H: Host> CommandRouter<H> {
    pub fn new(host: H, settings: SettingsSlot) -> Self {
        let handler = CommandHandler::new(host.clone());
        Self {
            host,
            settings,
            handler,
        }
    }

    pub fn settings(&self) -> &SettingsSlot {
        &self.settings
    }

    pub async fn activate(&self) -> Result<(), ActivateError> {
        let settings = self.settings.load();
        settings.validate().map_err(ActivateError::InvalidSettings)?;
        self.host
            .register_command(CommandSpec {
                trigger: settings.trigger.clone(),
                auto_complete: true,
                auto_complete_desc: String::from(COMMAND_DESCRIPTION),
            })
            .await
            .map_err(|source| ActivateError::Register {
                source,
                trigger: settings.trigger.clone(),
            })?;
        log::info!("Registered /{} command", settings.trigger);
        Ok(())
    }

    /// Handles `raw` (e.g. `/silencer @bob`) sent by `user_id`.
    ///
    /// Only the first token after the trigger is looked at.
    pub async fn execute(&self, user_id: &str, raw: &str) -> CommandResponse {
        let settings = self.settings.load();
        let mut fields = raw.split_whitespace();
        let trigger = fields.next().map(|token| token.strip_prefix('/').unwrap_or(token));
        if trigger != Some(settings.trigger.as_str()) {
            return CommandResponse::ephemeral(unknown_command_text(raw));
        }
        let subcommand = Subcommand::parse(fields.next());
        log::debug!("Got /{} {:?} from {}", settings.trigger, subcommand, user_id);
        CommandResponse::ephemeral(self.handler.execute(user_id, &subcommand, &settings).await)
    }
}

#[derive(Debug)]
pub enum ActivateError {
    InvalidSettings(SettingsError),
    Register { source: HostError, trigger: String },
}

impl fmt::Display for ActivateError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::ActivateError::*;
        match self {
            InvalidSettings(err) => write!(out, "Invalid silencer settings: {}", err),
            Register { source, trigger } => write!(out, "Failed to register {} command: {}", trigger, source),
        }
    }
}

impl Error for ActivateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use self::ActivateError::*;
        Some(match self {
            InvalidSettings(err) => err,
            Register { source, .. } => source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PluginSettings, host::MemoryHost};

    fn router() -> (MemoryHost, CommandRouter<MemoryHost>) {
        let host = MemoryHost::new().with_user("u-alice", "alice").with_user("u-bob", "bob");
        (host.clone(), CommandRouter::new(host, SettingsSlot::default()))
    }

    #[tokio::test]
    async fn activate_registers_single_command() {
        let (host, router) = router();
        router.activate().await.unwrap();
        assert_eq!(
            host.commands(),
            vec![CommandSpec {
                trigger: String::from("silencer"),
                auto_complete: true,
                auto_complete_desc: String::from("Toggles silencing of users."),
            }]
        );
    }

    #[tokio::test]
    async fn activate_rejects_invalid_settings() {
        let host = MemoryHost::new();
        let settings = SettingsSlot::new(PluginSettings {
            trigger: String::from("two words"),
            ..PluginSettings::default()
        });
        let router = CommandRouter::new(host.clone(), settings);
        assert!(matches!(
            router.activate().await,
            Err(ActivateError::InvalidSettings(_))
        ));
        assert!(host.commands().is_empty());
    }

    #[tokio::test]
    async fn foreign_trigger_is_unknown() {
        let (host, router) = router();
        let response = router.execute("u-alice", "/mute @bob").await;
        assert_eq!(response.text, "Unknown command: /mute @bob");
        assert!(host.events().is_empty());
    }

    #[tokio::test]
    async fn empty_input_is_unknown() {
        let (_, router) = router();
        assert_eq!(router.execute("u-alice", "   ").await.text, "Unknown command:    ");
    }

    #[tokio::test]
    async fn trigger_without_slash_is_accepted() {
        let (_, router) = router();
        let response = router.execute("u-alice", "silencer help").await;
        assert!(response.text.starts_with("###### User Silencer"));
    }

    #[tokio::test]
    async fn extra_tokens_are_ignored() {
        let (host, router) = router();
        let response = router.execute("u-alice", "/silencer  @bob @alice trailing").await;
        assert_eq!(response.text, "@alice asked @bob to be quiet");
        assert_eq!(host.raw("u-alice-block-list").unwrap(), br#"["bob"]"#.to_vec());
    }

    #[tokio::test]
    async fn unbalanced_quote_is_echoed_verbatim() {
        let (_, router) = router();
        let response = router.execute("u-alice", "/silencer don't").await;
        assert_eq!(response.text, "Unknown command: don't");
        let response = router.execute("u-alice", "/silencer \"foo bar\"").await;
        assert_eq!(response.text, "Unknown command: \"foo");
    }

    #[tokio::test]
    async fn unknown_subcommand_is_echoed() {
        let (_, router) = router();
        let response = router.execute("u-alice", "/silencer foo").await;
        assert!(response.text.contains("foo"));
    }
}
