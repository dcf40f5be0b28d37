//! Runtime for the conversation engine
//!
//! Owns everything that lives across events: gating, the session store, the
//! delivery channel and the background worker. Each update is processed as
//! gate → session checkout → route → handler → effects → commit.

mod executor;
mod worker;

#[cfg(test)]
pub mod testing;

pub use executor::EffectRunner;
pub use worker::{spawn_worker, Job, WorkerHandle, DEFAULT_QUEUE_CAPACITY};

use tokio::time::Instant;
use tracing::Instrument;

use crate::channel::{Channel, ChatId, InboundEvent, InboundKind, Surface, Update};
use crate::conversation::{self, route, AdminControls, Route, Trigger, Turn};
use crate::gate::{GateDecision, Gatekeeper};
use crate::gateway::DataGateway;
use crate::render::{text, PAGE_SIZE};
use crate::session::{FlowTimeouts, SessionStore};

/// Knobs the handlers read
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub page_size: usize,
    pub timeouts: FlowTimeouts,
    /// Chat that receives feedback notices
    pub admin_channel: Option<ChatId>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            timeouts: FlowTimeouts::default(),
            admin_channel: None,
        }
    }
}

pub struct Engine<G, C> {
    gate: Gatekeeper<G>,
    gateway: G,
    channel: C,
    sessions: SessionStore,
    worker: WorkerHandle,
    admin: AdminControls,
    settings: EngineSettings,
}

impl<G: DataGateway, C: Channel> Engine<G, C> {
    pub fn new(
        gate: Gatekeeper<G>,
        gateway: G,
        channel: C,
        worker: WorkerHandle,
        admin: AdminControls,
        settings: EngineSettings,
    ) -> Self {
        Self {
            gate,
            gateway,
            channel,
            sessions: SessionStore::new(),
            worker,
            admin,
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn handle_update(&self, update: Update) {
        let update_id = update.update_id;
        match update.into_event() {
            Some(event) => self.handle(event).await,
            None => tracing::debug!(update_id, "Ignoring unsupported update"),
        }
    }

    pub async fn handle(&self, event: InboundEvent) {
        let span = tracing::info_span!(
            "update",
            update_id = event.update_id,
            user_id = event.user_id()
        );
        self.dispatch(event).instrument(span).await;
    }

    async fn dispatch(&self, event: InboundEvent) {
        let started = std::time::Instant::now();
        let InboundEvent {
            user, chat_id, kind, ..
        } = event;
        let Some(user) = user else {
            tracing::debug!("Event without sender");
            return;
        };
        let user_id = user.telegram_user_id;
        let callback_id = match &kind {
            InboundKind::Callback { id, .. } => Some(id.as_str()),
            _ => None,
        };

        match self.gate.check(Some(user_id)).await {
            GateDecision::Allow => {}
            GateDecision::SilentDrop => {
                if let Some(id) = callback_id {
                    self.answer(id, None).await;
                }
                return;
            }
            GateDecision::ReplyAndDrop(notice) => {
                match callback_id {
                    // alerts are plain text with a length cap
                    Some(id) => {
                        let alert = text::truncate(&notice, text::ALERT_MAX_CHARS);
                        self.answer(id, Some(&alert)).await;
                    }
                    None => {
                        let message = text::escape(&notice);
                        if let Err(e) = self.channel.send_message(chat_id, &message, None).await {
                            tracing::warn!(error = %e, "Could not send maintenance notice");
                        }
                    }
                }
                return;
            }
        }

        let mut session = self.sessions.checkout(user_id).await;
        let expired = session.expire(Instant::now(), self.settings.timeouts);
        if !expired.is_empty() {
            tracing::info!(flows = ?expired, "Conversation timed out");
        }

        let (incoming, pressed) = match &kind {
            InboundKind::Command { message, .. } | InboundKind::Text { message, .. } => {
                (Some(*message), None)
            }
            InboundKind::Callback {
                message, is_media, ..
            } => {
                let pressed = message.map(|m| {
                    if *is_media {
                        Surface::media(m)
                    } else {
                        Surface::text(m)
                    }
                });
                (None, pressed)
            }
        };

        let routed = route(&session, Trigger::from_kind(&kind));
        tracing::debug!(route = ?routed, browse = ?session.browse_state(), "Routed event");

        let flow = routed.flow();
        // the pressed message becomes the surface of the flow owning the button
        if let (Route::Browse(_) | Route::Feedback(_), Some(flow), Some(pressed)) =
            (&routed, flow, pressed)
        {
            session.set_surface(flow, Some(pressed));
        }
        let toast_pending = matches!(routed, Route::Expired);

        let mut turn = Turn {
            gateway: &self.gateway,
            session: &mut session,
            out: EffectRunner::new(&self.channel, &self.worker, chat_id, flow, callback_id),
            user: &user,
            incoming,
            pressed,
            settings: &self.settings,
            elevated: self.gate.is_elevated(user_id),
        };
        if !toast_pending {
            // stop the client spinner before any slow gateway call
            turn.out.acknowledge().await;
        }
        conversation::run(routed, &mut turn, &self.admin).await;
        turn.out.acknowledge().await;

        tracing::debug!(
            browse = ?session.browse_state(),
            feedback = ?session.feedback_state(),
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Event handled"
        );
        self.sessions.commit(user_id, session).await;
    }

    async fn answer(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self
            .channel
            .answer_callback(callback_id, text, text.is_some())
            .await
        {
            tracing::debug!(error = %e, "Could not answer callback");
        }
    }
}
