use crate::{plugin::CommandRouter, services::TelegramHost};
use carapax::{methods::SendMessage, types::Message, Api, ExecuteError, Ref};
use std::{error::Error, fmt};

/// Forwards the message text to the router untouched; the router does its own tokenization.
pub async fn handle(
    api: Ref<Api>,
    router: Ref<CommandRouter<TelegramHost>>,
    message: Message,
) -> Result<(), SilencerError> {
    let text = match message.get_text() {
        Some(text) => text.data.as_str(),
        None => return Ok(()),
    };
    let settings = router.settings().load();
    let raw = match invocation(text, &settings.trigger) {
        Some(raw) => raw,
        None => return Ok(()),
    };
    let user_id = match message.get_user() {
        Some(user) => user.id,
        None => {
            log::warn!("Got /{} without a sender in chat {}", settings.trigger, message.get_chat_id());
            return Ok(());
        }
    };
    let response = router.execute(&user_id.to_string(), &raw).await;

    // Replies go to the sender's private chat so nobody else sees them.
    let mut method = SendMessage::new(user_id, response.text);
    if message.get_chat_id() == user_id {
        method = method.reply_to_message_id(message.id);
    }
    api.execute(method).await.map_err(SilencerError::SendMessage)?;
    Ok(())
}

/// Returns the command text when its first token is `/<trigger>`, optionally
/// addressed to a bot as `/<trigger>@botname`; the mention is dropped.
fn invocation(text: &str, trigger: &str) -> Option<String> {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    let (first, rest) = text.split_at(end);
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    if name == trigger {
        Some(format!("/{}{}", name, rest))
    } else {
        None
    }
}

#[derive(Debug)]
pub enum SilencerError {
    SendMessage(ExecuteError),
}

impl fmt::Display for SilencerError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::SilencerError::*;
        match self {
            SendMessage(err) => write!(out, "could not send silencer reply: {}", err),
        }
    }
}

impl Error for SilencerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use self::SilencerError::*;
        Some(match self {
            SendMessage(err) => err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_kept_verbatim() {
        assert_eq!(invocation("/silencer", "silencer").as_deref(), Some("/silencer"));
        assert_eq!(
            invocation("/silencer don't", "silencer").as_deref(),
            Some("/silencer don't")
        );
        assert_eq!(
            invocation("/silencer \"foo bar\"", "silencer").as_deref(),
            Some("/silencer \"foo bar\"")
        );
    }

    #[test]
    fn bot_mention_is_dropped() {
        assert_eq!(
            invocation("/silencer@mute_bot @bob", "silencer").as_deref(),
            Some("/silencer @bob")
        );
    }

    #[test]
    fn other_messages_are_ignored() {
        assert_eq!(invocation("hello /silencer", "silencer"), None);
        assert_eq!(invocation("silencer @bob", "silencer"), None);
        assert_eq!(invocation("/silencers", "silencer"), None);
        assert_eq!(invocation("/start", "silencer"), None);
        assert_eq!(invocation("", "silencer"), None);
    }
}
