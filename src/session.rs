//! Session context store
//!
//! Per-user conversation state and typed context slots. Slots are namespaced
//! per flow so the browse and feedback conversations never see each other's
//! values. Sessions live in process memory only and disappear on cancel,
//! restart or inactivity.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::channel::{MessageRef, Surface};
use crate::conversation::{BrowseState, FeedbackState, Flow, Next};
use crate::gateway::{CourseRef, OfferingSummary, ProfessorRef, Term};
use crate::render::payload::NavOrigin;

pub type UserId = i64;

// ============================================================================
// Slot values
// ============================================================================

/// A result list frozen at query time together with its page cursor.
///
/// Items and cursor live in one value so they are always written and cleared together.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultList<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub query: Option<String>,
}

impl<T> ResultList<T> {
    pub fn new(items: Vec<T>, query: Option<String>) -> Self {
        Self {
            items,
            page: 0,
            query,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Course,
    Professor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedProf {
    pub id: i64,
    pub name: String,
}

/// Everything fetched for one professor: raw offerings plus the de-duplicated course menu
#[derive(Debug, Clone, PartialEq)]
pub struct ProfCourses {
    pub prof_id: i64,
    pub offerings: Vec<OfferingSummary>,
    pub courses: ResultList<CourseRef>,
}

/// Term menu for the selected course, remembering how the course was reached
#[derive(Debug, Clone, PartialEq)]
pub struct TermMenu {
    pub course: String,
    pub origin: NavOrigin,
    pub terms: ResultList<Term>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Bug,
    Suggestion,
    General,
}

impl FeedbackKind {
    pub fn display(self) -> &'static str {
        match self {
            FeedbackKind::Bug => "🐞 Bug Report",
            FeedbackKind::Suggestion => "💡 Suggestion",
            FeedbackKind::General => "💬 General Feedback",
        }
    }

    /// Value the data service stores
    pub fn api_value(self) -> &'static str {
        match self {
            FeedbackKind::Bug => "bug",
            FeedbackKind::Suggestion => "suggestion",
            FeedbackKind::General => "general",
        }
    }
}

// ============================================================================
// Slot namespaces
// ============================================================================

/// Names of the browse-flow slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseSlot {
    CourseSearch,
    ProfSearch,
    SelectedProf,
    ProfCourses,
    Terms,
}

impl BrowseSlot {
    #[cfg(test)]
    pub const ALL: [BrowseSlot; 5] = [
        BrowseSlot::CourseSearch,
        BrowseSlot::ProfSearch,
        BrowseSlot::SelectedProf,
        BrowseSlot::ProfCourses,
        BrowseSlot::Terms,
    ];

    /// Slots whose contents were derived from this one and go stale when it changes
    pub fn dependents(self) -> &'static [BrowseSlot] {
        match self {
            BrowseSlot::CourseSearch | BrowseSlot::ProfCourses => &[BrowseSlot::Terms],
            BrowseSlot::ProfSearch => &[
                BrowseSlot::SelectedProf,
                BrowseSlot::ProfCourses,
                BrowseSlot::Terms,
            ],
            BrowseSlot::SelectedProf => &[BrowseSlot::ProfCourses, BrowseSlot::Terms],
            BrowseSlot::Terms => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseSlots {
    pub mode: Option<SearchMode>,
    pub course_search: Option<ResultList<CourseRef>>,
    pub prof_search: Option<ResultList<ProfessorRef>>,
    pub selected_prof: Option<SelectedProf>,
    pub prof_courses: Option<ProfCourses>,
    pub terms: Option<TermMenu>,
    /// Last grade card sent; its buttons are removed when the user moves on
    pub final_card: Option<MessageRef>,
    /// Browse prompt that later browse prompts edit in place
    pub surface: Option<Surface>,
}

impl BrowseSlots {
    #[cfg(test)]
    pub fn is_set(&self, slot: BrowseSlot) -> bool {
        match slot {
            BrowseSlot::CourseSearch => self.course_search.is_some(),
            BrowseSlot::ProfSearch => self.prof_search.is_some(),
            BrowseSlot::SelectedProf => self.selected_prof.is_some(),
            BrowseSlot::ProfCourses => self.prof_courses.is_some(),
            BrowseSlot::Terms => self.terms.is_some(),
        }
    }

    pub fn clear(&mut self, slot: BrowseSlot) {
        match slot {
            BrowseSlot::CourseSearch => self.course_search = None,
            BrowseSlot::ProfSearch => self.prof_search = None,
            BrowseSlot::SelectedProf => self.selected_prof = None,
            BrowseSlot::ProfCourses => self.prof_courses = None,
            BrowseSlot::Terms => self.terms = None,
        }
    }

    /// Clear every slot derived from `slot`, leaving `slot` itself intact.
    pub fn clear_dependents(&mut self, slot: BrowseSlot) {
        for dependent in slot.dependents() {
            self.clear(*dependent);
        }
    }

    /// Start a new search in `mode`, dropping everything from earlier searches.
    pub fn begin_search(&mut self, mode: SearchMode) {
        *self = BrowseSlots {
            mode: Some(mode),
            final_card: self.final_card.take(),
            surface: self.surface.take(),
            ..BrowseSlots::default()
        };
    }

    /// Professor currently selected, if it matches `prof_id`
    pub fn prof_named(&self, prof_id: i64) -> Option<&SelectedProf> {
        self.selected_prof.as_ref().filter(|p| p.id == prof_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackSlots {
    pub kind: Option<FeedbackKind>,
    pub message: Option<String>,
    pub surface: Option<Surface>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub browse: BrowseSlots,
    pub feedback: FeedbackSlots,
}

// ============================================================================
// Session
// ============================================================================

/// Current state of one active flow and when the user last touched it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowState<S> {
    pub state: S,
    pub last_activity: Instant,
}

impl<S> FlowState<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            last_activity: Instant::now(),
        }
    }
}

/// Inactivity limits per flow
#[derive(Debug, Clone, Copy)]
pub struct FlowTimeouts {
    pub browse: Duration,
    pub feedback: Duration,
}

impl Default for FlowTimeouts {
    fn default() -> Self {
        Self {
            browse: Duration::from_secs(600),
            feedback: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub browse: Option<FlowState<BrowseState>>,
    pub feedback: Option<FlowState<FeedbackState>>,
    pub context: SessionContext,
}

impl Session {
    pub fn browse_state(&self) -> Option<BrowseState> {
        self.browse.map(|f| f.state)
    }

    pub fn feedback_state(&self) -> Option<FeedbackState> {
        self.feedback.map(|f| f.state)
    }

    /// Clear both flows and all context, then open the browse flow at its start menu.
    pub fn hard_reset(&mut self) {
        self.context = SessionContext::default();
        self.feedback = None;
        self.browse = Some(FlowState::new(BrowseState::SelectingAction));
    }

    pub fn end(&mut self, flow: Flow) {
        match flow {
            Flow::Browse => {
                self.browse = None;
                self.context.browse = BrowseSlots::default();
            }
            Flow::Feedback => {
                self.feedback = None;
                self.context.feedback = FeedbackSlots::default();
            }
        }
    }

    pub fn advance_browse(&mut self, next: Next<BrowseState>) {
        if advance(&mut self.browse, next) {
            self.end(Flow::Browse);
        }
    }

    pub fn advance_feedback(&mut self, next: Next<FeedbackState>) {
        if advance(&mut self.feedback, next) {
            self.end(Flow::Feedback);
        }
    }

    /// Bot message holding `flow`'s current prompt
    pub fn surface(&self, flow: Flow) -> Option<Surface> {
        match flow {
            Flow::Browse => self.context.browse.surface,
            Flow::Feedback => self.context.feedback.surface,
        }
    }

    pub fn set_surface(&mut self, flow: Flow, surface: Option<Surface>) {
        match flow {
            Flow::Browse => self.context.browse.surface = surface,
            Flow::Feedback => self.context.feedback.surface = surface,
        }
    }

    /// Drop every surface pointing at `message`, e.g. after it was deleted.
    pub fn forget_surface(&mut self, message: MessageRef) {
        for flow in [Flow::Browse, Flow::Feedback] {
            if self.surface(flow).is_some_and(|s| s.message == message) {
                self.set_surface(flow, None);
            }
        }
    }

    /// End flows idle for longer than their timeout. Returns the flows that expired.
    pub fn expire(&mut self, now: Instant, timeouts: FlowTimeouts) -> Vec<Flow> {
        let mut expired = Vec::new();
        if self
            .browse
            .is_some_and(|f| now.duration_since(f.last_activity) >= timeouts.browse)
        {
            self.end(Flow::Browse);
            expired.push(Flow::Browse);
        }
        if self
            .feedback
            .is_some_and(|f| now.duration_since(f.last_activity) >= timeouts.feedback)
        {
            self.end(Flow::Feedback);
            expired.push(Flow::Feedback);
        }
        expired
    }

    /// Nothing worth keeping: no active flow and no cached context.
    pub fn is_idle(&self) -> bool {
        self.browse.is_none() && self.feedback.is_none() && self.context == SessionContext::default()
    }
}

/// Apply `next` to one flow slot. Returns true when the flow ended.
fn advance<S>(flow: &mut Option<FlowState<S>>, next: Next<S>) -> bool {
    match next {
        Next::Stay => {
            if let Some(current) = flow {
                current.last_activity = Instant::now();
            }
            false
        }
        Next::Goto(state) => {
            *flow = Some(FlowState::new(state));
            false
        }
        Next::End => true,
    }
}

// ============================================================================
// Store
// ============================================================================

/// Process-wide map of sessions.
///
/// Handlers check out a copy, work on it across awaits, and commit it back;
/// the lock is never held across an await. A user's concurrent events are not
/// serialized, so the last commit wins.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<UserId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn checkout(&self, user_id: UserId) -> Session {
        self.inner
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn commit(&self, user_id: UserId, session: Session) {
        let mut sessions = self.inner.write().await;
        if session.is_idle() {
            sessions.remove(&user_id);
        } else {
            sessions.insert(user_id, session);
        }
    }

    /// Expire idle flows in every session and drop sessions left empty.
    pub async fn sweep(&self, timeouts: FlowTimeouts) -> usize {
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        let mut expired_flows = 0;
        sessions.retain(|user_id, session| {
            let expired = session.expire(now, timeouts);
            if !expired.is_empty() {
                tracing::info!(user_id, flows = ?expired, "Conversation timed out");
                expired_flows += expired.len();
            }
            !session.is_idle()
        });
        expired_flows
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
