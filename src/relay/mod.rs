//! Voice relay - forwards users' voice recordings to a channel.

pub mod handlers;
pub mod message;
pub mod permissions;
pub mod telegram;
pub mod texts;


pub use handlers::{BotIdentity, Relay};
pub use message::InboundEvent;
pub use telegram::TelegramClient;
