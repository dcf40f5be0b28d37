//! Mock implementations for testing
//!
//! These mocks enable end-to-end conversation tests without real I/O.

use super::{EffectRunner, Engine, EngineSettings, Job, WorkerHandle};
use crate::channel::{
    Button, Channel, ChannelError, ChatId, InboundEvent, InboundKind, Keyboard, MessageRef,
};
use crate::conversation::{AdminControls, Flow, Turn};
use crate::flags::{FlagError, FlagResult};
use crate::gate::{BlockCache, ElevatedIds, Gatekeeper, MaintenanceMode, MaintenanceSource};
use crate::gateway::{
    ActorId, BlockStatusUpdate, BroadcastReceipt, DataGateway, FeedbackReceipt,
    FeedbackSubmission, GatewayError, GradeDistribution, OfferingDetails, OfferingScope,
    OfferingSummary, ProfessorDossier, SearchHits, SearchKind, Term, UserProfile, UserStatus,
};
use crate::render::payload::Callback;
use crate::session::Session;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const CHAT_ID: ChatId = 5;
pub const USER_ID: i64 = 5;
pub const ADMIN_ID: i64 = 1;

// ============================================================================
// Mock Data Gateway
// ============================================================================

/// Queued responses for one gateway method
pub struct Responses<T>(Mutex<VecDeque<Result<T, GatewayError>>>);

impl<T> Default for Responses<T> {
    fn default() -> Self {
        Self(Mutex::new(VecDeque::new()))
    }
}

impl<T> Responses<T> {
    pub fn push(&self, response: Result<T, GatewayError>) {
        self.0.lock().unwrap().push_back(response);
    }

    fn take(&self, method: &str) -> Result<T, GatewayError> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network(format!("no mock response for {method}"))))
    }
}

/// Gateway that returns queued responses per method and records every call
#[derive(Default)]
pub struct MockGateway {
    pub search: Responses<SearchHits>,
    pub list_offerings: Responses<Vec<OfferingSummary>>,
    pub offering_details: Responses<OfferingDetails>,
    pub grade_distribution: Responses<GradeDistribution>,
    pub professor_dossier: Responses<ProfessorDossier>,
    pub user_status: Responses<UserStatus>,
    pub set_block_status: Responses<UserStatus>,
    pub subscribe: Responses<UserStatus>,
    pub unsubscribe: Responses<UserStatus>,
    pub submit_feedback: Responses<FeedbackReceipt>,
    pub enqueue_broadcast: Responses<BroadcastReceipt>,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, as `method:argument`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DataGateway for MockGateway {
    async fn search(
        &self,
        query: &str,
        kind: SearchKind,
        _actor: ActorId,
    ) -> Result<SearchHits, GatewayError> {
        self.record(format!("search:{kind:?}:{query}"));
        self.search.take("search")
    }

    async fn list_offerings(
        &self,
        scope: &OfferingScope,
        _actor: ActorId,
    ) -> Result<Vec<OfferingSummary>, GatewayError> {
        self.record(format!("list_offerings:{scope:?}"));
        self.list_offerings.take("list_offerings")
    }

    async fn offering_details(
        &self,
        course_code: &str,
        term: &Term,
        _actor: ActorId,
    ) -> Result<OfferingDetails, GatewayError> {
        self.record(format!("offering_details:{course_code}:{}", term.label()));
        self.offering_details.take("offering_details")
    }

    async fn grade_distribution(
        &self,
        offering_id: i64,
        _actor: ActorId,
    ) -> Result<GradeDistribution, GatewayError> {
        self.record(format!("grade_distribution:{offering_id}"));
        self.grade_distribution.take("grade_distribution")
    }

    async fn professor_dossier(
        &self,
        prof_id: i64,
        _actor: ActorId,
    ) -> Result<ProfessorDossier, GatewayError> {
        self.record(format!("professor_dossier:{prof_id}"));
        self.professor_dossier.take("professor_dossier")
    }

    async fn user_status(&self, user: &str, _actor: ActorId) -> Result<UserStatus, GatewayError> {
        self.record(format!("user_status:{user}"));
        self.user_status.take("user_status")
    }

    async fn set_block_status(
        &self,
        user: &str,
        update: &BlockStatusUpdate,
        _actor: ActorId,
    ) -> Result<UserStatus, GatewayError> {
        self.record(format!("set_block_status:{user}:{}", update.is_blocked));
        self.set_block_status.take("set_block_status")
    }

    async fn subscribe(&self, profile: &UserProfile) -> Result<UserStatus, GatewayError> {
        self.record(format!("subscribe:{}", profile.telegram_user_id));
        self.subscribe.take("subscribe")
    }

    async fn unsubscribe(&self, user_id: i64) -> Result<UserStatus, GatewayError> {
        self.record(format!("unsubscribe:{user_id}"));
        self.unsubscribe.take("unsubscribe")
    }

    async fn submit_feedback(
        &self,
        submission: &FeedbackSubmission,
    ) -> Result<FeedbackReceipt, GatewayError> {
        self.record(format!("submit_feedback:{}", submission.feedback_type));
        self.submit_feedback.take("submit_feedback")
    }

    async fn enqueue_broadcast(
        &self,
        text: &str,
        _actor: ActorId,
    ) -> Result<BroadcastReceipt, GatewayError> {
        self.record(format!("enqueue_broadcast:{text}"));
        self.enqueue_broadcast.take("enqueue_broadcast")
    }
}

// ============================================================================
// Recording Channel
// ============================================================================

/// One successful outbound operation
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Message {
        chat_id: ChatId,
        message_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        chat_id: ChatId,
        message_id: i64,
        photo: String,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        message_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Markup {
        message_id: i64,
        keyboard: Option<Keyboard>,
    },
    Delete {
        message_id: i64,
    },
    Answer {
        callback_id: String,
        text: Option<String>,
    },
}

impl Sent {
    /// Message id and visible text of anything the user now sees
    pub fn shown(&self) -> Option<(i64, &str, Option<&Keyboard>)> {
        match self {
            Sent::Message {
                message_id,
                text,
                keyboard,
                ..
            }
            | Sent::Edit {
                message_id,
                text,
                keyboard,
            } => Some((*message_id, text.as_str(), keyboard.as_ref())),
            Sent::Photo {
                message_id,
                caption,
                keyboard,
                ..
            } => Some((*message_id, caption.as_str(), keyboard.as_ref())),
            _ => None,
        }
    }
}

/// Channel that records every delivered operation
pub struct RecordingChannel {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI64,
    fail_edits: AtomicBool,
    fail_photos: AtomicBool,
}

impl Default for RecordingChannel {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
            fail_edits: AtomicBool::new(false),
            fail_photos: AtomicBool::new(false),
        }
    }
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Reject every text edit from now on
    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn fail_photos(&self) {
        self.fail_photos.store(true, Ordering::SeqCst);
    }

    /// The latest message the user sees, as (message id, text, keyboard)
    pub fn last_shown(&self) -> Option<(i64, String, Option<Keyboard>)> {
        self.sent()
            .iter()
            .rev()
            .find_map(Sent::shown)
            .map(|(id, text, keyboard)| (id, text.to_string(), keyboard.cloned()))
    }

    /// Message currently carrying a button with `payload`, and whether it is a photo
    pub fn message_with(&self, payload: &str) -> Option<(i64, bool)> {
        self.sent().iter().rev().find_map(|s| {
            let (id, _, keyboard) = s.shown()?;
            keyboard?
                .buttons()
                .any(|b| b.payload == payload)
                .then_some((id, matches!(s, Sent::Photo { .. })))
        })
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }

    fn message(&self, chat_id: ChatId) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        }
    }
}

fn rejected(method: &'static str) -> ChannelError {
    ChannelError::Rejected {
        method,
        description: "Bad Request: mocked failure".to_string(),
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        let message = self.message(chat_id);
        self.record(Sent::Message {
            chat_id,
            message_id: message.message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(message)
    }

    async fn edit_message_text(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(rejected("editMessageText"));
        }
        self.record(Sent::Edit {
            message_id: target.message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn edit_reply_markup(
        &self,
        target: MessageRef,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        self.record(Sent::Markup {
            message_id: target.message_id,
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn delete_message(&self, target: MessageRef) -> Result<(), ChannelError> {
        self.record(Sent::Delete {
            message_id: target.message_id,
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, ChannelError> {
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(rejected("sendPhoto"));
        }
        let message = self.message(chat_id);
        self.record(Sent::Photo {
            chat_id,
            message_id: message.message_id,
            photo: photo.to_string(),
            caption: caption.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(message)
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        _alert: bool,
    ) -> Result<(), ChannelError> {
        self.record(Sent::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }
}

// ============================================================================
// Static Maintenance Flag
// ============================================================================

/// In-memory maintenance flag; `failing()` simulates an unreadable store
pub struct StaticMaintenance(Mutex<Option<MaintenanceMode>>);

impl StaticMaintenance {
    pub fn mode(mode: MaintenanceMode) -> Self {
        Self(Mutex::new(Some(mode)))
    }

    pub fn failing() -> Self {
        Self(Mutex::new(None))
    }
}

impl MaintenanceSource for StaticMaintenance {
    fn maintenance_state(&self) -> FlagResult<MaintenanceMode> {
        self.0.lock().unwrap().clone().ok_or(FlagError::Poisoned)
    }

    fn set_maintenance_state(&self, mode: &MaintenanceMode) -> FlagResult<()> {
        let mut current = self.0.lock().unwrap();
        if current.is_none() {
            return Err(FlagError::Poisoned);
        }
        *current = Some(mode.clone());
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn user(user_id: i64) -> UserProfile {
    UserProfile {
        telegram_user_id: user_id,
        first_name: Some("Ana".to_string()),
        last_name: Some("Lima".to_string()),
        username: Some("ana".to_string()),
    }
}

/// Everything a handler needs, owned, for calling handlers directly
pub struct TurnFixture {
    pub gateway: Arc<MockGateway>,
    pub channel: RecordingChannel,
    pub worker: WorkerHandle,
    pub jobs: mpsc::Receiver<Job>,
    pub session: Session,
    pub user: UserProfile,
    pub settings: EngineSettings,
    pub incoming: Option<MessageRef>,
    /// Flow the handler runs for; its surface is the one edited
    pub flow: Option<Flow>,
    pub elevated: bool,
}

impl TurnFixture {
    pub fn new() -> Self {
        let (worker, jobs) = WorkerHandle::detached(16);
        Self {
            gateway: Arc::new(MockGateway::new()),
            channel: RecordingChannel::new(),
            worker,
            jobs,
            session: Session::default(),
            user: user(USER_ID),
            settings: EngineSettings::default(),
            incoming: None,
            flow: Some(Flow::Browse),
            elevated: false,
        }
    }

    pub fn turn(&mut self) -> Turn<'_> {
        Turn {
            gateway: &*self.gateway,
            session: &mut self.session,
            out: EffectRunner::new(&self.channel, &self.worker, CHAT_ID, self.flow, None),
            user: &self.user,
            incoming: self.incoming,
            pressed: None,
            settings: &self.settings,
            elevated: self.elevated,
        }
    }
}

pub type TestEngine = Engine<Arc<MockGateway>, Arc<RecordingChannel>>;

/// A full engine over mocks, driven by synthetic inbound events
pub struct Harness {
    pub engine: TestEngine,
    pub gateway: Arc<MockGateway>,
    pub channel: Arc<RecordingChannel>,
    pub maintenance: Arc<StaticMaintenance>,
    pub jobs: mpsc::Receiver<Job>,
    next_update: AtomicI64,
    next_user_message: AtomicI64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        let gateway = Arc::new(MockGateway::new());
        let channel = Arc::new(RecordingChannel::new());
        let maintenance = Arc::new(StaticMaintenance::mode(MaintenanceMode::Off));
        let blocks = BlockCache::new(Duration::ZERO);
        let (worker, jobs) = WorkerHandle::detached(16);
        let gate = Gatekeeper::new(
            ElevatedIds::new([ADMIN_ID]),
            maintenance.clone(),
            gateway.clone(),
            blocks.clone(),
        );
        let admin = AdminControls {
            maintenance: maintenance.clone(),
            blocks,
        };
        let engine = Engine::new(
            gate,
            gateway.clone(),
            channel.clone(),
            worker,
            admin,
            settings,
        );
        Self {
            engine,
            gateway,
            channel,
            maintenance,
            jobs,
            next_update: AtomicI64::new(1),
            next_user_message: AtomicI64::new(1),
        }
    }

    fn user_message(&self) -> MessageRef {
        MessageRef {
            chat_id: CHAT_ID,
            message_id: self.next_user_message.fetch_add(1, Ordering::SeqCst),
        }
    }

    async fn deliver(&self, user_id: i64, kind: InboundKind) {
        let event = InboundEvent {
            update_id: self.next_update.fetch_add(1, Ordering::SeqCst),
            user: Some(user(user_id)),
            chat_id: CHAT_ID,
            kind,
        };
        self.engine.handle(event).await;
    }

    pub async fn command(&self, user_id: i64, name: &str, args: Option<&str>) {
        let kind = InboundKind::Command {
            name: name.to_string(),
            args: args.map(str::to_string),
            message: self.user_message(),
        };
        self.deliver(user_id, kind).await;
    }

    pub async fn text(&self, user_id: i64, text: &str) {
        let kind = InboundKind::Text {
            text: text.to_string(),
            message: self.user_message(),
        };
        self.deliver(user_id, kind).await;
    }

    /// Press the button with this payload on the latest message carrying it
    pub async fn press(&self, user_id: i64, callback: &Callback) {
        let payload = callback.encode();
        let pressed = self.channel.message_with(&payload);
        self.press_on(user_id, &payload, pressed).await;
    }

    /// Press `payload` on an explicit message, `(message id, is photo)`
    pub async fn press_on(&self, user_id: i64, payload: &str, pressed: Option<(i64, bool)>) {
        let kind = InboundKind::Callback {
            id: format!("cb{}", self.next_update.load(Ordering::SeqCst)),
            payload: payload.to_string(),
            message: pressed.map(|(message_id, _)| MessageRef {
                chat_id: CHAT_ID,
                message_id,
            }),
            is_media: pressed.is_some_and(|(_, media)| media),
        };
        self.deliver(user_id, kind).await;
    }

    /// Item buttons and controls of the latest message, as labels
    pub fn last_labels(&self) -> Vec<String> {
        self.channel
            .last_shown()
            .and_then(|(_, _, keyboard)| keyboard)
            .map(|k| k.buttons().map(|b: &Button| b.label.clone()).collect())
            .unwrap_or_default()
    }

    pub fn last_text(&self) -> String {
        self.channel
            .last_shown()
            .map(|(_, text, _)| text)
            .unwrap_or_default()
    }

    pub async fn session(&self, user_id: i64) -> Session {
        self.engine.sessions().checkout(user_id).await
    }
}
