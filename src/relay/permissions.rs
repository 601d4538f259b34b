//! The bot's standing in the target channel.
//!
//! A forward only makes sense when the bot is an administrator (or the
//! creator) of the channel and holds every capability in
//! [`Capability::REQUIRED`]. The check runs on every voice submission and on
//! `/status` and `/perms`; nothing is cached.

use std::fmt;

use teloxide::types::{ChatId, UserId};
use tracing::error;

use crate::relay::telegram::{ApiFailure, ChannelApi};

/// Membership status, spelled the way the Bot API spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Administrator => "administrator",
            Self::Member => "member",
            Self::Restricted => "restricted",
            Self::Left => "left",
            Self::Kicked => "kicked",
        }
    }

    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator)
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    PostMessages,
    SendMedia,
}

impl Capability {
    pub const REQUIRED: [Capability; 2] = [Capability::PostMessages, Capability::SendMedia];

    pub fn name(self) -> &'static str {
        match self {
            Self::PostMessages => "Post Messages",
            Self::SendMedia => "Send Media",
        }
    }
}

/// What the backend told us about the bot's membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionReport {
    pub status: MemberStatus,
    pub can_post_messages: bool,
    pub can_send_media: bool,
}

impl PermissionReport {
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::PostMessages => self.can_post_messages,
            Capability::SendMedia => self.can_send_media,
        }
    }

    pub fn verdict(&self) -> Verdict {
        if !self.status.is_privileged() {
            return Verdict::NotReady(NotReadyReason::NotAdmin(self.status));
        }
        match Capability::REQUIRED.into_iter().find(|c| !self.has(*c)) {
            Some(missing) => Verdict::NotReady(NotReadyReason::Missing(missing)),
            None => Verdict::Ready,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotReadyReason {
    NotAdmin(MemberStatus),
    Missing(Capability),
    /// The membership lookup itself failed.
    Unreachable(ApiFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ready,
    NotReady(NotReadyReason),
}

impl Verdict {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Ask the backend for the bot's membership in `channel` and judge it.
///
/// Never fails: lookup errors become [`NotReadyReason::Unreachable`]. Every
/// negative outcome is logged.
pub async fn check<A: ChannelApi>(api: &A, channel: ChatId, bot_id: UserId) -> Verdict {
    let verdict = match api.get_member_permissions(channel, bot_id).await {
        Ok(report) => report.verdict(),
        Err(failure) => Verdict::NotReady(NotReadyReason::Unreachable(failure)),
    };

    match &verdict {
        Verdict::Ready => {}
        Verdict::NotReady(NotReadyReason::NotAdmin(status)) => {
            error!("Bot is not admin in channel {} (status: {})", channel, status);
        }
        Verdict::NotReady(NotReadyReason::Missing(capability)) => {
            error!("Missing permission: {}", capability.name());
        }
        Verdict::NotReady(NotReadyReason::Unreachable(failure)) => {
            error!("Permission check failed: {}", failure);
        }
    }

    verdict
}
