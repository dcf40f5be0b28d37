//! Inbound Telegram updates

use super::{ChatId, MessageRef};
use crate::gateway::UserProfile;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9_]+)(?:@[A-Za-z0-9_]+)?(?:\s+([\s\S]*))?$")
        .expect("command pattern is valid")
});

/// Raw webhook update body (only the fields we route on)
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
    #[serde(default)]
    pub callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub chat: TgChat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgCallbackQuery {
    pub id: String,
    pub from: TgUser,
    #[serde(default)]
    pub message: Option<TgMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

impl From<TgUser> for UserProfile {
    fn from(user: TgUser) -> Self {
        UserProfile {
            telegram_user_id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
        }
    }
}

impl TgMessage {
    fn handle(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat.id,
            message_id: self.message_id,
        }
    }
}

/// Channel-neutral inbound event
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub update_id: i64,
    pub user: Option<UserProfile>,
    pub chat_id: ChatId,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundKind {
    Command {
        name: String,
        args: Option<String>,
        message: MessageRef,
    },
    Text {
        text: String,
        message: MessageRef,
    },
    Callback {
        id: String,
        payload: String,
        message: Option<MessageRef>,
        /// The pressed message carries a photo and cannot have its text edited
        is_media: bool,
    },
}

impl InboundEvent {
    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.telegram_user_id)
    }
}

/// Split `/name@bot args` into its lowercased name and optional trimmed argument string.
pub fn parse_command(text: &str) -> Option<(String, Option<String>)> {
    let caps = COMMAND_RE.captures(text.trim())?;
    let name = caps.get(1)?.as_str().to_ascii_lowercase();
    let args = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|a| !a.is_empty());
    Some((name, args))
}

impl Update {
    /// Convert to an inbound event; `None` for update kinds we do not route.
    pub fn into_event(self) -> Option<InboundEvent> {
        let update_id = self.update_id;

        if let Some(query) = self.callback_query {
            let message = query.message.as_ref().map(TgMessage::handle);
            let is_media = query.message.as_ref().is_some_and(|m| m.photo.is_some());
            let chat_id = message.map_or(query.from.id, |m| m.chat_id);
            return Some(InboundEvent {
                update_id,
                user: Some(query.from.into()),
                chat_id,
                kind: InboundKind::Callback {
                    id: query.id,
                    payload: query.data.unwrap_or_default(),
                    message,
                    is_media,
                },
            });
        }

        let message = self.message?;
        let handle = message.handle();
        let text = message.text?;
        let kind = match parse_command(&text) {
            Some((name, args)) => InboundKind::Command {
                name,
                args,
                message: handle,
            },
            None => InboundKind::Text {
                text,
                message: handle,
            },
        };
        Some(InboundEvent {
            update_id,
            user: message.from.map(Into::into),
            chat_id: handle.chat_id,
            kind,
        })
    }
}
