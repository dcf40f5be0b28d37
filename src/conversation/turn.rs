//! Per-event handler context

use super::outcome::Effect;
use crate::channel::{MessageRef, Surface};
use crate::gateway::{DataGateway, UserProfile};
use crate::runtime::{EffectRunner, EngineSettings};
use crate::session::{BrowseSlots, FeedbackSlots, Session, UserId};

/// Everything a handler may touch while processing one event.
///
/// The session is a private snapshot; the runtime commits it after the
/// handler returns.
pub struct Turn<'a> {
    pub gateway: &'a dyn DataGateway,
    pub session: &'a mut Session,
    pub out: EffectRunner<'a>,
    pub user: &'a UserProfile,
    /// The user's own message, for text and command events
    pub incoming: Option<MessageRef>,
    /// Message whose button was pressed, for callback events
    pub pressed: Option<Surface>,
    pub settings: &'a EngineSettings,
    pub elevated: bool,
}

impl Turn<'_> {
    pub fn actor(&self) -> UserId {
        self.user.telegram_user_id
    }

    /// Bot message holding the prompt of the flow being handled
    pub fn surface(&self) -> Option<Surface> {
        self.session.surface(self.out.flow()?)
    }

    pub fn browse(&mut self) -> &mut BrowseSlots {
        &mut self.session.context.browse
    }

    pub fn feedback(&mut self) -> &mut FeedbackSlots {
        &mut self.session.context.feedback
    }

    /// Perform an effect right away, before the handler finishes.
    pub async fn emit(&mut self, effect: Effect) {
        self.out.run(effect, self.session).await;
    }

    /// Replace the prompt with a status line while a slow call runs.
    pub async fn progress(&mut self, text: impl Into<String>) {
        self.emit(Effect::show_text(text)).await;
    }
}
