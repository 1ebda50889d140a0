//! Channel abstraction for message I/O.

pub mod channel;
pub mod telegram;

pub use channel::{Channel, IncomingMessage, InlineButton, MessageStream, OutgoingReply};
pub use telegram::TelegramChannel;
