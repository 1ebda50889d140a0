//! Channel trait and message types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;

/// A text message received from the transport.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Channel name this message arrived on.
    pub channel: &'static str,
    /// Chat to reply into.
    pub chat_id: String,
    /// Sender's platform user id.
    pub user_id: i64,
    /// Sender's handle, if they have one.
    pub username: Option<String>,
    /// Raw text body.
    pub text: String,
}

impl IncomingMessage {
    /// The command name when the body is a `/`-prefixed transport command.
    ///
    /// A `@botname` suffix (group-chat addressing) is stripped, so both
    /// `/start` and `/start@RecruitBot` yield `"start"`.
    pub fn command(&self) -> Option<&str> {
        let rest = self.text.strip_prefix('/')?;
        let name = rest.split_whitespace().next().unwrap_or("");
        Some(name.split('@').next().unwrap_or(""))
    }
}

/// A single inline URL button attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub url: String,
}

/// An outbound reply: text plus an optional call-to-action button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    pub text: String,
    pub button: Option<InlineButton>,
}

impl OutgoingReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            button: None,
        }
    }

    pub fn with_button(text: impl Into<String>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            button: Some(InlineButton {
                label: label.into(),
                url: url.into(),
            }),
        }
    }
}

/// Stream of incoming messages from a channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A message transport the bot can listen on and reply through.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name for logging.
    fn name(&self) -> &str;

    /// Begin listening; returns the stream of incoming messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Send a reply into the chat a message came from.
    async fn respond(&self, msg: &IncomingMessage, reply: OutgoingReply)
    -> Result<(), ChannelError>;

    /// Verify the transport is reachable before starting.
    async fn health_check(&self) -> Result<(), ChannelError>;

    /// Graceful shutdown.
    async fn shutdown(&self) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> IncomingMessage {
        IncomingMessage {
            channel: "test",
            chat_id: "1".into(),
            user_id: 1,
            username: None,
            text: text.into(),
        }
    }

    #[test]
    fn command_parses_start() {
        assert_eq!(msg("/start").command(), Some("start"));
        assert_eq!(msg("/start some args").command(), Some("start"));
    }

    #[test]
    fn command_strips_bot_suffix() {
        assert_eq!(msg("/start@RecruitBot").command(), Some("start"));
    }

    #[test]
    fn free_text_is_not_a_command() {
        assert_eq!(msg("Oslo, 30").command(), None);
        assert_eq!(msg("").command(), None);
    }

    #[test]
    fn reply_constructors() {
        let plain = OutgoingReply::text("hi");
        assert!(plain.button.is_none());

        let with_button = OutgoingReply::with_button("hi", "Open", "https://t.me/manager");
        assert_eq!(
            with_button.button,
            Some(InlineButton {
                label: "Open".into(),
                url: "https://t.me/manager".into()
            })
        );
    }
}
