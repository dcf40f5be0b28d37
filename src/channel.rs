//! Delivery channel abstraction
//!
//! Outbound message operations and inbound event parsing. The conversation
//! engine only sees these types; the Telegram Bot API lives behind them.

mod telegram;
mod update;

pub use telegram::TelegramChannel;
pub use update::{InboundEvent, InboundKind, Update};

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub type ChatId = i64;

/// Handle of a message already delivered to a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}

/// A message the bot may edit, and whether it carries media (media captions are never edited)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub message: MessageRef,
    pub is_media: bool,
}

impl Surface {
    pub fn text(message: MessageRef) -> Self {
        Self {
            message,
            is_media: false,
        }
    }

    pub fn media(message: MessageRef) -> Self {
        Self {
            message,
            is_media: true,
        }
    }
}

/// Inline button: visible label plus opaque callback payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: Vec<Button>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn single(self, button: Button) -> Self {
        self.row(vec![button])
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = Vec<Button>>) -> Self {
        for row in rows {
            self = self.row(row);
        }
        self
    }

    /// All buttons, row by row
    #[cfg(test)]
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("{method} rejected: {description}")]
    Rejected {
        method: &'static str,
        description: String,
    },
    #[error("{method} transport failure: {message}")]
    Transport {
        method: &'static str,
        message: String,
    },
}

/// Outbound operations of a chat channel. All text is HTML.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, ChannelError>;

    async fn edit_message_text(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError>;

    async fn edit_reply_markup(
        &self,
        target: MessageRef,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError>;

    async fn delete_message(&self, target: MessageRef) -> Result<(), ChannelError>;

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, ChannelError>;

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), ChannelError>;
}

#[async_trait]
impl<T: Channel + ?Sized> Channel for Arc<T> {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        (**self).send_message(chat_id, text, keyboard).await
    }

    async fn edit_message_text(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        (**self).edit_message_text(target, text, keyboard).await
    }

    async fn edit_reply_markup(
        &self,
        target: MessageRef,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        (**self).edit_reply_markup(target, keyboard).await
    }

    async fn delete_message(&self, target: MessageRef) -> Result<(), ChannelError> {
        (**self).delete_message(target).await
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        (**self).send_photo(chat_id, photo, caption, keyboard).await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), ChannelError> {
        (**self).answer_callback(callback_id, text, alert).await
    }
}
