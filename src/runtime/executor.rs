//! Effect execution against the delivery channel
//!
//! Channel failures never fail a turn: each is logged, and where a fallback
//! exists (edit → send, photo → text) the fallback is used. Each flow edits
//! only its own surface; replies outside both flows always arrive as new messages.

use super::worker::WorkerHandle;
use crate::channel::{Channel, ChatId, Keyboard, MessageRef, Surface};
use crate::conversation::{Effect, Flow, Post};
use crate::session::Session;

pub struct EffectRunner<'a> {
    channel: &'a dyn Channel,
    worker: &'a WorkerHandle,
    chat_id: ChatId,
    /// Flow whose surface is edited and replaced
    flow: Option<Flow>,
    /// Pressed button awaiting its answer
    callback_id: Option<&'a str>,
    answered: bool,
}

impl<'a> EffectRunner<'a> {
    pub fn new(
        channel: &'a dyn Channel,
        worker: &'a WorkerHandle,
        chat_id: ChatId,
        flow: Option<Flow>,
        callback_id: Option<&'a str>,
    ) -> Self {
        Self {
            channel,
            worker,
            chat_id,
            flow,
            callback_id,
            answered: false,
        }
    }

    pub fn flow(&self) -> Option<Flow> {
        self.flow
    }

    pub async fn run(&mut self, effect: Effect, session: &mut Session) {
        match effect {
            Effect::Show { text, keyboard } => self.show(&text, keyboard.as_ref(), session).await,
            Effect::Send(post) => self.send(post, session).await,
            Effect::StripButtons(target) => {
                if let Err(e) = self.channel.edit_reply_markup(target, None).await {
                    tracing::debug!(message_id = target.message_id, error = %e, "Could not strip buttons");
                }
            }
            Effect::Delete(target) => {
                session.forget_surface(target);
                if let Err(e) = self.channel.delete_message(target).await {
                    tracing::debug!(message_id = target.message_id, error = %e, "Could not delete message");
                }
            }
            Effect::Toast { text, alert } => self.answer(Some(&text), alert).await,
            Effect::Submit(job) => self.worker.submit(job),
        }
    }

    /// Answer the pressed button without a notice, unless it was already answered.
    pub async fn acknowledge(&mut self) {
        self.answer(None, false).await;
    }

    async fn answer(&mut self, text: Option<&str>, alert: bool) {
        let Some(callback_id) = self.callback_id else {
            return;
        };
        if self.answered {
            return;
        }
        self.answered = true;
        if let Err(e) = self.channel.answer_callback(callback_id, text, alert).await {
            tracing::debug!(error = %e, "Could not answer callback");
        }
    }

    async fn show(&mut self, text: &str, keyboard: Option<&Keyboard>, session: &mut Session) {
        match self.flow.and_then(|flow| session.surface(flow)) {
            Some(surface) if !surface.is_media => {
                match self.channel.edit_message_text(surface.message, text, keyboard).await {
                    Ok(()) => {
                        consume_card(session, surface.message);
                        return;
                    }
                    Err(e) => {
                        tracing::debug!(message_id = surface.message.message_id, error = %e, "Edit failed; sending instead");
                    }
                }
            }
            // captions of media messages are left as they are
            Some(surface) => {
                consume_card(session, surface.message);
                if let Err(e) = self.channel.edit_reply_markup(surface.message, None).await {
                    tracing::debug!(message_id = surface.message.message_id, error = %e, "Could not strip buttons");
                }
            }
            None => {}
        }
        self.send_text(text, keyboard, session).await;
    }

    async fn send(&mut self, post: Post, session: &mut Session) {
        let keyboard = post.keyboard.as_ref();
        let sent = match post.photo.as_deref() {
            Some(photo) => match self
                .channel
                .send_photo(self.chat_id, photo, &post.text, keyboard)
                .await
            {
                Ok(message) => {
                    self.adopt(session, Surface::media(message));
                    Some(message)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Photo send failed; falling back to text");
                    self.send_text(&post.text, keyboard, session).await
                }
            },
            None => self.send_text(&post.text, keyboard, session).await,
        };
        if post.card {
            session.context.browse.final_card = sent;
        }
    }

    async fn send_text(
        &mut self,
        text: &str,
        keyboard: Option<&Keyboard>,
        session: &mut Session,
    ) -> Option<MessageRef> {
        match self.channel.send_message(self.chat_id, text, keyboard).await {
            Ok(message) => {
                self.adopt(session, Surface::text(message));
                Some(message)
            }
            Err(e) => {
                tracing::error!(chat_id = self.chat_id, error = %e, "Send failed");
                None
            }
        }
    }

    /// Make a freshly sent message the surface of the flow being handled.
    fn adopt(&self, session: &mut Session, surface: Surface) {
        if let Some(flow) = self.flow {
            session.set_surface(flow, Some(surface));
        }
    }
}

/// A grade card that gets replaced is no longer a card.
fn consume_card(session: &mut Session, message: MessageRef) {
    if session.context.browse.final_card == Some(message) {
        session.context.browse.final_card = None;
    }
}
