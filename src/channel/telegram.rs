//! Telegram Bot API channel

use super::{Channel, ChannelError, ChatId, Keyboard, MessageRef};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const API_ROOT: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
    chat: SentChat,
}

#[derive(Debug, Deserialize)]
struct SentChat {
    id: ChatId,
}

pub struct TelegramChannel {
    client: Client,
    base_url: String,
}

impl TelegramChannel {
    pub fn new(token: &str, timeout: Duration) -> Result<Self, ChannelError> {
        Self::with_api_root(API_ROOT, token, timeout)
    }

    /// Point at a non-default Bot API server (local bot API, tests).
    pub fn with_api_root(api_root: &str, token: &str, timeout: Duration) -> Result<Self, ChannelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Transport {
                method: "client",
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{token}", api_root.trim_end_matches('/')),
        })
    }

    /// Register the webhook URL Telegram should post updates to.
    pub async fn set_webhook(&self, url: &str) -> Result<(), ChannelError> {
        self.call::<Value>(
            "setWebhook",
            json!({ "url": url, "allowed_updates": ["message", "callback_query"] }),
        )
        .await
        .map(|_| ())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: Value,
    ) -> Result<T, ChannelError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Transport {
                method,
                message: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    // reqwest errors embed the URL, which carries the token
                    e.without_url().to_string()
                },
            })?;

        let envelope: Envelope<T> = response.json().await.map_err(|e| ChannelError::Transport {
            method,
            message: format!("invalid response: {}", e.without_url()),
        })?;

        match envelope {
            Envelope {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            Envelope { description, .. } => Err(ChannelError::Rejected {
                method,
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }

    /// Edits that change nothing are rejected by Telegram; they are not failures for us.
    async fn call_edit(&self, method: &'static str, body: Value) -> Result<(), ChannelError> {
        match self.call::<Value>(method, body).await {
            Ok(_) => Ok(()),
            Err(ChannelError::Rejected { description, .. }) if is_not_modified(&description) => {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn is_not_modified(description: &str) -> bool {
    description.contains("message is not modified")
}

fn markup(keyboard: Option<&Keyboard>) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .map(|k| {
            k.rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| json!({ "text": b.label, "callback_data": b.payload }))
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default();
    json!({ "inline_keyboard": rows })
}

fn with_markup(mut body: Value, keyboard: Option<&Keyboard>) -> Value {
    if keyboard.is_some() {
        body["reply_markup"] = markup(keyboard);
    }
    body
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        let body = with_markup(
            json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }),
            keyboard,
        );
        let sent: SentMessage = self.call("sendMessage", body).await?;
        Ok(MessageRef {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        })
    }

    async fn edit_message_text(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let body = with_markup(
            json!({
                "chat_id": target.chat_id,
                "message_id": target.message_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }),
            keyboard,
        );
        self.call_edit("editMessageText", body).await
    }

    async fn edit_reply_markup(
        &self,
        target: MessageRef,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let body = json!({
            "chat_id": target.chat_id,
            "message_id": target.message_id,
            "reply_markup": markup(keyboard),
        });
        self.call_edit("editMessageReplyMarkup", body).await
    }

    async fn delete_message(&self, target: MessageRef) -> Result<(), ChannelError> {
        self.call::<Value>(
            "deleteMessage",
            json!({ "chat_id": target.chat_id, "message_id": target.message_id }),
        )
        .await
        .map(|_| ())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        let body = with_markup(
            json!({
                "chat_id": chat_id,
                "photo": photo,
                "caption": caption,
                "parse_mode": "HTML",
            }),
            keyboard,
        );
        let sent: SentMessage = self.call("sendPhoto", body).await?;
        Ok(MessageRef {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        })
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), ChannelError> {
        let mut body = json!({ "callback_query_id": callback_id, "show_alert": alert });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call::<Value>("answerCallbackQuery", body)
            .await
            .map(|_| ())
    }
}
