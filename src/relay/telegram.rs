//! Telegram client using teloxide.

use std::fmt;
use std::future::Future;

use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{
    ChatMemberKind, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId,
    ParseMode, ReplyParameters,
};
use tracing::{info, warn};

use crate::relay::permissions::{MemberStatus, PermissionReport};

/// Coarse category of a failed Bot API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The bot was kicked, blocked, or is not allowed to write there.
    Forbidden,
    /// Telegram rejected the request, typically an unknown chat.
    BadRequest,
    Network,
    Other,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::BadRequest => "bad request",
            Self::Network => "network",
            Self::Other => "other",
        }
    }
}

/// A failed Bot API call: its category plus the raw error text for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl ApiFailure {
    /// Classify by the error text Telegram returns (`Forbidden: ...`,
    /// `Bad Request: ...`).
    pub fn from_text(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let kind = if detail.contains("Forbidden") {
            FailureKind::Forbidden
        } else if detail.contains("Bad Request") {
            FailureKind::BadRequest
        } else {
            FailureKind::Other
        };
        Self { kind, detail }
    }
}

impl From<RequestError> for ApiFailure {
    fn from(e: RequestError) -> Self {
        let network = matches!(e, RequestError::Network(_) | RequestError::Io(_));
        let detail = e.to_string();
        if network {
            Self { kind: FailureKind::Network, detail }
        } else {
            Self::from_text(detail)
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.detail, self.kind.as_str())
    }
}

impl std::error::Error for ApiFailure {}

/// An inline button that opens a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlButton {
    pub text: String,
    pub url: reqwest::Url,
}

/// A text message sent back to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: ChatId,
    pub text: String,
    /// Thread the reply under this message.
    pub reply_to: Option<MessageId>,
    pub html: bool,
    pub button: Option<UrlButton>,
}

impl Reply {
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
            html: false,
            button: None,
        }
    }

    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    pub fn html(mut self) -> Self {
        self.html = true;
        self
    }

    pub fn button(mut self, button: UrlButton) -> Self {
        self.button = Some(button);
        self
    }
}

/// The Bot API calls the relay makes. Implemented by [`TelegramClient`] in
/// production and by a recording fake in tests.
pub trait ChannelApi: Send + Sync {
    /// Membership of `user_id` in `chat_id`, reduced to what the relay needs.
    fn get_member_permissions(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> impl Future<Output = Result<PermissionReport, ApiFailure>> + Send;

    /// Returns the id of the sent message.
    fn send_reply(&self, reply: Reply) -> impl Future<Output = Result<MessageId, ApiFailure>> + Send;

    /// Send an already uploaded voice file by id. Returns the id of the sent message.
    fn send_voice(
        &self,
        chat_id: ChatId,
        file_id: &FileId,
        caption: &str,
    ) -> impl Future<Output = Result<MessageId, ApiFailure>> + Send;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn report_from_kind(kind: &ChatMemberKind) -> PermissionReport {
    let (status, can_post_messages, can_send_media) = match kind {
        ChatMemberKind::Owner(_) => (MemberStatus::Creator, true, true),
        // Administrators are not subject to media restrictions.
        ChatMemberKind::Administrator(a) => (MemberStatus::Administrator, a.can_post_messages, true),
        ChatMemberKind::Member(_) => (MemberStatus::Member, false, false),
        ChatMemberKind::Restricted(_) => (MemberStatus::Restricted, false, false),
        ChatMemberKind::Left => (MemberStatus::Left, false, false),
        ChatMemberKind::Banned(_) => (MemberStatus::Kicked, false, false),
    };
    PermissionReport {
        status,
        can_post_messages,
        can_send_media,
    }
}

impl ChannelApi for TelegramClient {
    async fn get_member_permissions(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<PermissionReport, ApiFailure> {
        info!("Getting chat member: chat={}, user={}", chat_id, user_id);

        let member = self
            .bot
            .get_chat_member(chat_id, user_id)
            .await
            .map_err(|e| {
                let failure = ApiFailure::from(e);
                warn!("Failed to get chat member: {}", failure);
                failure
            })?;

        Ok(report_from_kind(&member.kind))
    }

    async fn send_reply(&self, reply: Reply) -> Result<MessageId, ApiFailure> {
        let mut request = self.bot.send_message(reply.chat_id, reply.text);

        if reply.html {
            request = request.parse_mode(ParseMode::Html);
        }

        if let Some(msg_id) = reply.reply_to {
            request = request.reply_parameters(ReplyParameters::new(msg_id));
        }

        if let Some(button) = reply.button {
            let keyboard =
                InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(button.text, button.url)]]);
            request = request.reply_markup(keyboard);
        }

        request.await.map(|msg| msg.id).map_err(|e| {
            let failure = ApiFailure::from(e);
            warn!("Failed to send: {}", failure);
            failure
        })
    }

    async fn send_voice(
        &self,
        chat_id: ChatId,
        file_id: &FileId,
        caption: &str,
    ) -> Result<MessageId, ApiFailure> {
        info!("🔊 Sending voice to chat {}", chat_id);

        self.bot
            .send_voice(chat_id, InputFile::file_id(file_id.clone()))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await
            .map(|msg| msg.id)
            .map_err(|e| {
                let failure = ApiFailure::from(e);
                warn!("Failed to send voice: {}", failure);
                failure
            })
    }
}
