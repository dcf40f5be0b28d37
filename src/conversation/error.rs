//! Handler errors and the boundary that turns them into replies

use thiserror::Error;

use super::backtrack::{resolve, BackTarget, Resolution};
use super::outcome::{Effect, Outcome};
use super::turn::Turn;
use super::BrowseState;
use crate::channel::Keyboard;
use crate::gateway::{GatewayError, GatewayErrorKind};
use crate::render::keyboards::restart;
use crate::render::text;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Input rejected; re-prompt in place and keep the state
    #[error("invalid input")]
    Validation { prompt: String, keyboard: Keyboard },

    #[error("data service returned {status}: {message}")]
    RemoteHttp { status: u16, message: String },

    #[error("data service unreachable: {0}")]
    RemoteNetwork(String),

    /// An expected slot is missing or belongs to another selection
    #[error("missing context: {missing}")]
    StaleContext {
        missing: &'static str,
        fallback: Option<BackTarget>,
    },

    #[error("{0}")]
    Unexpected(String),
}

pub type HandlerResult<S> = Result<Outcome<S>, HandlerError>;

impl HandlerError {
    pub fn validation(prompt: impl Into<String>, keyboard: Keyboard) -> Self {
        HandlerError::Validation {
            prompt: prompt.into(),
            keyboard,
        }
    }

    pub fn stale(missing: &'static str, fallback: Option<BackTarget>) -> Self {
        HandlerError::StaleContext { missing, fallback }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        HandlerError::Unexpected(message.into())
    }

    /// Convert into the single reply the user sees, logging what they don't.
    pub fn recover(self, turn: &mut Turn<'_>) -> Outcome<BrowseState> {
        let user_id = turn.actor();
        match self {
            HandlerError::Validation { prompt, keyboard } => {
                tracing::debug!(user_id, "Validation failed, re-prompting");
                Outcome::stay().with_effect(Effect::show(prompt, keyboard))
            }
            HandlerError::RemoteHttp { status, message } => {
                tracing::error!(user_id, status, error = %message, "Data service error");
                Outcome::end().with_effect(Effect::show(text::http_error(status), restart()))
            }
            HandlerError::RemoteNetwork(message) => {
                tracing::warn!(user_id, error = %message, "Data service unreachable");
                Outcome::end().with_effect(Effect::show(text::NETWORK_ERROR, restart()))
            }
            HandlerError::StaleContext { missing, fallback } => {
                tracing::info!(user_id, missing, ?fallback, "Stale context");
                let page_size = turn.settings.page_size;
                let resolution = match fallback {
                    Some(target) => resolve(target, turn.browse(), page_size),
                    None => Resolution::Restart,
                };
                match resolution {
                    Resolution::Menu { menu, .. } => Outcome::goto(menu.state)
                        .with_effect(Effect::show(menu.text, menu.keyboard)),
                    Resolution::Restart => {
                        Outcome::end().with_effect(Effect::show_text(text::SESSION_EXPIRED))
                    }
                }
            }
            HandlerError::Unexpected(message) => {
                tracing::error!(user_id, error = %message, "Unexpected handler failure");
                Outcome::end().with_effect(Effect::show(text::UNEXPECTED_ERROR, restart()))
            }
        }
    }
}

impl From<GatewayError> for HandlerError {
    fn from(e: GatewayError) -> Self {
        match e.kind {
            GatewayErrorKind::Http => HandlerError::RemoteHttp {
                status: e.status.unwrap_or_default(),
                message: e.message,
            },
            GatewayErrorKind::Network => HandlerError::RemoteNetwork(e.message),
            GatewayErrorKind::Decode | GatewayErrorKind::Request => {
                HandlerError::Unexpected(e.to_string())
            }
        }
    }
}
