//! Command, voice and fallback handlers.

use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::relay::message::{Command, Content, InboundEvent, Route};
use crate::relay::permissions::{self, Verdict};
use crate::relay::telegram::{ChannelApi, FailureKind, Reply, UrlButton};
use crate::relay::texts;

/// The bot's own account, fetched once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: UserId,
    pub username: String,
}

/// Everything a handler needs: immutable configuration, the bot identity and
/// the API client.
pub struct Relay<A> {
    config: Config,
    identity: BotIdentity,
    api: A,
}

impl<A: ChannelApi> Relay<A> {
    pub fn new(config: Config, identity: BotIdentity, api: A) -> Self {
        Self { config, identity, api }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    pub async fn check_permissions(&self) -> Verdict {
        permissions::check(&self.api, self.config.channel_id, self.identity.id).await
    }

    /// Run the one handler this event routes to.
    pub async fn handle(&self, event: &InboundEvent) {
        match event.route(&self.identity.username) {
            Route::Command(Command::Start | Command::Help) => self.handle_welcome(event).await,
            Route::Command(Command::Status) => self.handle_status(event).await,
            Route::Command(Command::Perms) => self.handle_perms(event).await,
            Route::Voice(file_id) => self.handle_voice(event, &file_id).await,
            Route::Fallback => self.handle_fallback(event).await,
        }
    }

    fn reply(&self, event: &InboundEvent, text: impl Into<String>) -> Reply {
        Reply::text(event.chat_id, text).reply_to(event.message_id)
    }

    async fn handle_welcome(&self, event: &InboundEvent) {
        let text = texts::welcome(&self.config.channel_title, &self.config.channel_link);
        if let Err(e) = self.api.send_reply(self.reply(event, text).html()).await {
            error!("Error sending welcome: {}", e);
        }
    }

    async fn handle_status(&self, event: &InboundEvent) {
        let ready = self.check_permissions().await.is_ready();
        let text = texts::status(&self.config.channel_title, self.config.channel_id, ready);
        if let Err(e) = self.api.send_reply(self.reply(event, text)).await {
            error!("Error sending status: {}", e);
        }
    }

    async fn handle_perms(&self, event: &InboundEvent) {
        let Some(sender_id) = event.sender_id() else {
            return;
        };
        if !self.config.is_admin(sender_id) {
            debug!("Ignoring /perms from non-admin {}", sender_id);
            return;
        }

        let text = match self
            .api
            .get_member_permissions(self.config.channel_id, self.identity.id)
            .await
        {
            Ok(report) => texts::permissions(&self.config.channel_title, &report),
            Err(failure) => {
                error!("Permission lookup for /perms failed: {}", failure);
                texts::permissions_check_failed(failure.kind.as_str())
            }
        };
        if let Err(e) = self.api.send_reply(self.reply(event, text)).await {
            error!("Error sending permissions: {}", e);
        }
    }

    fn fix_permissions_button(&self) -> Option<UrlButton> {
        let url = texts::add_to_channel_url(&self.identity.username);
        match reqwest::Url::parse(&url) {
            Ok(url) => Some(UrlButton {
                text: texts::FIX_PERMISSIONS_BUTTON.to_string(),
                url,
            }),
            Err(e) => {
                warn!("Invalid add-to-channel link {}: {}", url, e);
                None
            }
        }
    }

    async fn handle_voice(&self, event: &InboundEvent, file_id: &FileId) {
        let sender = event.sender.as_ref();
        info!("🎙️ Voice from {}", texts::sender_label(sender));

        if !self.check_permissions().await.is_ready() {
            let mut reply = self.reply(event, texts::NOT_READY_WARNING);
            if let Some(button) = self.fix_permissions_button() {
                reply = reply.button(button);
            }
            if let Err(e) = self.api.send_reply(reply).await {
                error!("Error sending permission warning: {}", e);
            }
            return;
        }

        let caption = texts::voice_caption(sender);
        let text = match self.api.send_voice(self.config.channel_id, file_id, &caption).await {
            Ok(message_id) => {
                info!(
                    "Voice forwarded to {}, message ID: {}",
                    self.config.channel_id, message_id.0
                );
                texts::VOICE_RECEIVED
            }
            Err(failure) => {
                error!("Voice processing error: {}", failure);
                match failure.kind {
                    FailureKind::Forbidden => texts::BLOCKED_FROM_CHANNEL,
                    FailureKind::BadRequest => texts::INVALID_CHANNEL,
                    FailureKind::Network | FailureKind::Other => texts::FORWARD_FAILED,
                }
            }
        };

        if let Err(e) = self.api.send_reply(self.reply(event, text)).await {
            error!("Error replying to voice sender: {}", e);
        }
    }

    async fn handle_fallback(&self, event: &InboundEvent) {
        match &event.content {
            Content::Text(_) => {
                if let Err(e) = self.api.send_reply(self.reply(event, texts::VOICE_ONLY)).await {
                    error!("Error sending instructions: {}", e);
                }
            }
            Content::Other(kind) => debug!("Ignoring {} message in chat {}", kind, event.chat_id),
            Content::Voice(_) => {}
        }
    }
}
