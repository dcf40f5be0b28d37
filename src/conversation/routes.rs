//! Dispatch tables
//!
//! Maps an inbound event to exactly one action, or to nothing. Each flow
//! state has a closed whitelist; an event outside it is ignored rather than
//! routed somewhere else.

use super::backtrack::BackTarget;
use super::commands::AdminCommand;
use super::{BrowseState, FeedbackState, Flow};
use crate::channel::InboundKind;
use crate::gateway::Term;
use crate::render::payload::{Callback, ListRef, NavOrigin, PageRequest};
use crate::session::{FeedbackKind, SearchMode, Session};

/// Inbound event reduced to what routing needs
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Command { name: String, args: Option<String> },
    Text(String),
    Callback(Callback),
    /// Button payload that did not decode
    UnknownCallback(String),
}

impl Trigger {
    pub fn from_kind(kind: &InboundKind) -> Self {
        match kind {
            InboundKind::Command { name, args, .. } => Trigger::Command {
                name: name.clone(),
                args: args.clone(),
            },
            InboundKind::Text { text, .. } => Trigger::Text(text.clone()),
            InboundKind::Callback { payload, .. } => Callback::decode(payload)
                .map_or_else(|| Trigger::UnknownCallback(payload.clone()), Trigger::Callback),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BrowseAction {
    NewSearch,
    Close,
    ChooseMode(SearchMode),
    SearchInput(String),
    SelectCourse { code: String, origin: NavOrigin },
    SelectProf { prof_id: i64 },
    ViewProfCourses { prof_id: i64 },
    SelectTerm {
        course: String,
        term: Term,
        origin: NavOrigin,
    },
    Page(PageRequest),
    Back(BackTarget),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackAction {
    Begin,
    ChooseKind(FeedbackKind),
    Message(String),
    Confirm,
    ChangeType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlobalCommand {
    Help,
    Subscribe,
    Unsubscribe,
    Admin {
        command: AdminCommand,
        args: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Hard reset from any state
    Start,
    /// End both flows
    Cancel,
    Browse(BrowseAction),
    Feedback(FeedbackAction),
    Global(GlobalCommand),
    /// Not accepted in the current state
    Ignored,
    /// Button from a conversation that is no longer active
    Expired,
}

impl Route {
    /// Flow whose messages this route edits; global replies belong to neither.
    pub fn flow(&self) -> Option<Flow> {
        match self {
            Route::Start | Route::Cancel | Route::Browse(_) => Some(Flow::Browse),
            Route::Feedback(_) => Some(Flow::Feedback),
            Route::Global(_) | Route::Ignored | Route::Expired => None,
        }
    }
}

pub fn route(session: &Session, trigger: Trigger) -> Route {
    let active = session.browse.is_some() || session.feedback.is_some();
    match trigger {
        Trigger::Command { name, args } => match name.as_str() {
            "start" => Route::Start,
            "cancel" if active => Route::Cancel,
            "cancel" => Route::Ignored,
            "feedback" => Route::Feedback(FeedbackAction::Begin),
            "help" => Route::Global(GlobalCommand::Help),
            "subscribe" => Route::Global(GlobalCommand::Subscribe),
            "unsubscribe" => Route::Global(GlobalCommand::Unsubscribe),
            other => AdminCommand::from_name(other).map_or(Route::Ignored, |command| {
                Route::Global(GlobalCommand::Admin { command, args })
            }),
        },
        Trigger::Text(text) => text_route(session, text),
        Trigger::Callback(Callback::Cancel) if active => Route::Cancel,
        Trigger::Callback(Callback::Cancel) => Route::Expired,
        // entry point of the browse flow
        Trigger::Callback(Callback::NewSearch) => Route::Browse(BrowseAction::NewSearch),
        Trigger::Callback(
            cb @ (Callback::FeedbackType(_) | Callback::FeedbackConfirm | Callback::FeedbackChangeType),
        ) => match session.feedback_state() {
            Some(state) => feedback_callback(state, cb).map_or(Route::Ignored, Route::Feedback),
            None => Route::Expired,
        },
        Trigger::Callback(cb) => match session.browse_state() {
            Some(state) => browse_callback(state, cb).map_or(Route::Ignored, Route::Browse),
            None => Route::Expired,
        },
        Trigger::UnknownCallback(_) => Route::Ignored,
    }
}

/// Free text goes to whichever flow waits for it; when both do, the one touched last wins.
fn text_route(session: &Session, text: String) -> Route {
    let browse = session.browse.filter(|f| f.state.accepts_text());
    let feedback = session.feedback.filter(|f| f.state.accepts_text());
    match (browse, feedback) {
        (Some(b), Some(f)) if f.last_activity > b.last_activity => {
            Route::Feedback(FeedbackAction::Message(text))
        }
        (Some(_), _) => Route::Browse(BrowseAction::SearchInput(text)),
        (None, Some(_)) => Route::Feedback(FeedbackAction::Message(text)),
        (None, None) => Route::Ignored,
    }
}

fn browse_callback(state: BrowseState, cb: Callback) -> Option<BrowseAction> {
    if cb == Callback::Close {
        return Some(BrowseAction::Close);
    }
    if let Some(target) = BackTarget::from_callback(&cb) {
        return accepts_back(state, &target).then_some(BrowseAction::Back(target));
    }

    match state {
        BrowseState::SelectingAction => match cb {
            Callback::ModeCourse => Some(BrowseAction::ChooseMode(SearchMode::Course)),
            Callback::ModeProf => Some(BrowseAction::ChooseMode(SearchMode::Professor)),
            _ => None,
        },
        BrowseState::TypingCourse | BrowseState::TypingProf | BrowseState::ShowingFinalGrades => {
            None
        }
        BrowseState::SelectingCourseResults => match cb {
            Callback::SelectCourse {
                code,
                origin: NavOrigin::Course,
            } => Some(BrowseAction::SelectCourse {
                code,
                origin: NavOrigin::Course,
            }),
            Callback::Page(
                request @ PageRequest {
                    list: ListRef::CourseSearch,
                    ..
                },
            ) => Some(BrowseAction::Page(request)),
            _ => None,
        },
        BrowseState::SelectingProfResults => match cb {
            Callback::SelectProf { prof_id } => Some(BrowseAction::SelectProf { prof_id }),
            Callback::Page(
                request @ PageRequest {
                    list: ListRef::ProfSearch,
                    ..
                },
            ) => Some(BrowseAction::Page(request)),
            _ => None,
        },
        BrowseState::SelectingCourseForProf => match cb {
            Callback::SelectCourse {
                code,
                origin: origin @ NavOrigin::Professor(_),
            } => Some(BrowseAction::SelectCourse { code, origin }),
            Callback::Page(
                request @ PageRequest {
                    list: ListRef::ProfCourses { .. },
                    ..
                },
            ) => Some(BrowseAction::Page(request)),
            Callback::ViewProfCourses { prof_id } => Some(BrowseAction::ViewProfCourses { prof_id }),
            _ => None,
        },
        BrowseState::SelectingYearSemester => match cb {
            Callback::SelectTerm {
                course,
                term,
                origin,
            } => Some(BrowseAction::SelectTerm {
                course,
                term,
                origin,
            }),
            Callback::Page(
                request @ PageRequest {
                    list: ListRef::Terms { .. },
                    ..
                },
            ) => Some(BrowseAction::Page(request)),
            _ => None,
        },
    }
}

/// Back buttons each state offers. The professor search list is reachable from anywhere.
fn accepts_back(state: BrowseState, target: &BackTarget) -> bool {
    match target {
        BackTarget::ProfSearch => true,
        BackTarget::TypingCourse => state == BrowseState::SelectingCourseResults,
        BackTarget::TypingProf => state == BrowseState::SelectingProfResults,
        BackTarget::CourseSearch | BackTarget::ProfCourses { .. } => matches!(
            state,
            BrowseState::SelectingYearSemester | BrowseState::ShowingFinalGrades
        ),
        BackTarget::Terms { .. } => state == BrowseState::ShowingFinalGrades,
    }
}

fn feedback_callback(state: FeedbackState, cb: Callback) -> Option<FeedbackAction> {
    if cb == Callback::FeedbackChangeType {
        return Some(FeedbackAction::ChangeType);
    }
    match state {
        FeedbackState::AskFeedbackType => match cb {
            Callback::FeedbackType(kind) => Some(FeedbackAction::ChooseKind(kind)),
            _ => None,
        },
        FeedbackState::TypingFeedbackMessage => None,
        FeedbackState::ConfirmFeedbackSubmission => match cb {
            Callback::FeedbackConfirm => Some(FeedbackAction::Confirm),
            _ => None,
        },
    }
}
