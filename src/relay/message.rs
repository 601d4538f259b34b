//! Inbound events and routing.
//!
//! Every message becomes an [`InboundEvent`]; [`InboundEvent::route`] picks
//! exactly one handler. Commands are checked first, then voice recordings,
//! and everything else falls through to [`Route::Fallback`].

use teloxide::prelude::*;
use teloxide::types::{FileId, MessageId};
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "how to send a recording")]
    Start,
    #[command(description = "how to send a recording")]
    Help,
    #[command(description = "channel and permission status")]
    Status,
    #[command(description = "detailed permissions (admin only)")]
    Perms,
}

/// Who sent the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Voice(FileId),
    Text(String),
    /// Any other content type, by Bot API name.
    Other(&'static str),
}

/// One received message, reduced to what the handlers look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender: Option<Sender>,
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    Voice(FileId),
    Fallback,
}

fn content_of(msg: &Message) -> Content {
    if let Some(voice) = msg.voice() {
        return Content::Voice(voice.file.id.clone());
    }
    if let Some(text) = msg.text() {
        return Content::Text(text.to_string());
    }
    let kind = if msg.audio().is_some() {
        "audio"
    } else if msg.photo().is_some() {
        "photo"
    } else if msg.video().is_some() {
        "video"
    } else if msg.video_note().is_some() {
        "video_note"
    } else if msg.document().is_some() {
        "document"
    } else if msg.sticker().is_some() {
        "sticker"
    } else {
        "other"
    };
    Content::Other(kind)
}

impl InboundEvent {
    pub fn from_message(msg: &Message) -> Self {
        let sender = msg.from.as_ref().map(|user| Sender {
            id: user.id,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()).filter(|n| !n.is_empty()),
        });

        Self {
            chat_id: msg.chat.id,
            message_id: msg.id,
            sender,
            content: content_of(msg),
        }
    }

    pub fn sender_id(&self) -> Option<UserId> {
        self.sender.as_ref().map(|s| s.id)
    }

    /// Pick the handler for this event. `bot_username` lets `/cmd@bot` match.
    pub fn route(&self, bot_username: &str) -> Route {
        match &self.content {
            Content::Text(text) => {
                // Only the command word counts: `/start payload` is still `/start`.
                let word = text.split_whitespace().next().unwrap_or("");
                match Command::parse(word, bot_username) {
                    Ok(command) => Route::Command(command),
                    Err(_) => Route::Fallback,
                }
            }
            Content::Voice(file_id) => Route::Voice(file_id.clone()),
            Content::Other(_) => Route::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A private-chat message from user 7, as the Bot API delivers it.
    fn message(first_name: &str, username: Option<&str>, body: serde_json::Value) -> Message {
        let mut from = json!({ "id": 7, "is_bot": false, "first_name": first_name });
        let mut chat = json!({ "id": 7, "type": "private", "first_name": first_name });
        if let Some(username) = username {
            from["username"] = json!(username);
            chat["username"] = json!(username);
        }
        let mut raw = json!({
            "message_id": 100,
            "date": 1_700_000_000,
            "chat": chat,
            "from": from,
        });
        for (key, value) in body.as_object().expect("body is an object") {
            raw[key] = value.clone();
        }
        serde_json::from_value(raw).expect("valid Bot API message")
    }

    fn voice_body() -> serde_json::Value {
        json!({
            "voice": {
                "file_id": "AwACAgIAAxkBAAIBZ2",
                "file_unique_id": "AgADZ2",
                "duration": 4,
                "mime_type": "audio/ogg",
                "file_size": 12345
            }
        })
    }

    fn event(content: Content) -> InboundEvent {
        InboundEvent {
            chat_id: ChatId(7),
            message_id: MessageId(100),
            sender: Some(Sender {
                id: UserId(7),
                username: Some("reciter".to_string()),
                first_name: Some("Amina".to_string()),
            }),
            content,
        }
    }

    fn text(s: &str) -> InboundEvent {
        event(Content::Text(s.to_string()))
    }

    #[test]
    fn test_known_commands() {
        assert_eq!(text("/start").route("relay_bot"), Route::Command(Command::Start));
        assert_eq!(text("/help").route("relay_bot"), Route::Command(Command::Help));
        assert_eq!(text("/status").route("relay_bot"), Route::Command(Command::Status));
        assert_eq!(text("/perms").route("relay_bot"), Route::Command(Command::Perms));
    }

    #[test]
    fn test_command_addressed_to_bot() {
        assert_eq!(text("/status@relay_bot").route("relay_bot"), Route::Command(Command::Status));
    }

    #[test]
    fn test_command_addressed_to_other_bot_falls_back() {
        assert_eq!(text("/status@other_bot").route("relay_bot"), Route::Fallback);
    }

    #[test]
    fn test_command_with_payload() {
        assert_eq!(text("/start channel").route("relay_bot"), Route::Command(Command::Start));
    }

    #[test]
    fn test_unknown_command_falls_back() {
        assert_eq!(text("/unknown").route("relay_bot"), Route::Fallback);
    }

    #[test]
    fn test_plain_text_falls_back() {
        assert_eq!(text("hello").route("relay_bot"), Route::Fallback);
        assert_eq!(text("").route("relay_bot"), Route::Fallback);
    }

    #[test]
    fn test_voice_routes_to_voice() {
        let file_id = FileId("AwACAgIAAxkBAAIB".to_string());
        assert_eq!(
            event(Content::Voice(file_id.clone())).route("relay_bot"),
            Route::Voice(file_id)
        );
    }

    #[test]
    fn test_from_voice_message() {
        let event = InboundEvent::from_message(&message("Amina", Some("amina_r"), voice_body()));

        assert_eq!(event.chat_id, ChatId(7));
        assert_eq!(event.message_id, MessageId(100));
        assert_eq!(
            event.content,
            Content::Voice(FileId("AwACAgIAAxkBAAIBZ2".to_string()))
        );
        assert_eq!(
            event.sender,
            Some(Sender {
                id: UserId(7),
                username: Some("amina_r".to_string()),
                first_name: Some("Amina".to_string()),
            })
        );
    }

    #[test]
    fn test_voice_with_caption_is_still_voice() {
        let mut body = voice_body();
        body["caption"] = json!("my recitation");
        let event = InboundEvent::from_message(&message("Amina", None, body));
        assert!(matches!(event.content, Content::Voice(_)));
        assert!(matches!(event.route("relay_bot"), Route::Voice(_)));
    }

    #[test]
    fn test_from_text_message() {
        let msg = message("Amina", None, json!({ "text": "/status" }));
        let event = InboundEvent::from_message(&msg);

        assert_eq!(event.content, Content::Text("/status".to_string()));
        assert_eq!(event.route("relay_bot"), Route::Command(Command::Status));
        let sender = event.sender.expect("sender");
        assert_eq!(sender.id, UserId(7));
        assert_eq!(sender.username, None);
    }

    #[test]
    fn test_from_photo_message() {
        let photo = json!({
            "photo": [{
                "file_id": "AgACAgIAAxkBAAIBaGc",
                "file_unique_id": "AQADaGc",
                "width": 90,
                "height": 90,
                "file_size": 1024
            }]
        });
        let event = InboundEvent::from_message(&message("Amina", None, photo));

        assert_eq!(event.content, Content::Other("photo"));
        assert_eq!(event.route("relay_bot"), Route::Fallback);
    }

    #[test]
    fn test_empty_first_name_becomes_none() {
        let event = InboundEvent::from_message(&message("", Some("amina_r"), voice_body()));
        let sender = event.sender.expect("sender");
        assert_eq!(sender.first_name, None);
        assert_eq!(sender.username.as_deref(), Some("amina_r"));
    }

    #[test]
    fn test_other_content_falls_back() {
        assert_eq!(event(Content::Other("photo")).route("relay_bot"), Route::Fallback);
    }
}
