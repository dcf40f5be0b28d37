//! Handler results: the next state plus the effects that render it

use crate::channel::{Keyboard, MessageRef};
use crate::runtime::Job;

/// Outgoing message, optionally with a photo
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Photo file id; the text becomes its caption
    pub photo: Option<String>,
    /// Remember the sent message as the grade card so its buttons can be removed later
    pub card: bool,
}

/// Side effects a handler asks the runtime to perform, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Replace the active prompt in place; sends a new message when it cannot be edited
    Show {
        text: String,
        keyboard: Option<Keyboard>,
    },
    Send(Post),
    StripButtons(MessageRef),
    Delete(MessageRef),
    /// Answer the pressed button with a notification
    Toast { text: String, alert: bool },
    /// Hand work to the background worker
    Submit(Job),
}

impl Effect {
    pub fn show(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Effect::Show {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    pub fn show_text(text: impl Into<String>) -> Self {
        Effect::Show {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn send(text: impl Into<String>, keyboard: Option<Keyboard>) -> Self {
        Effect::Send(Post {
            text: text.into(),
            keyboard,
            photo: None,
            card: false,
        })
    }

    pub fn send_photo(photo: Option<String>, caption: impl Into<String>, keyboard: Keyboard) -> Self {
        Effect::Send(Post {
            text: caption.into(),
            keyboard: Some(keyboard),
            photo,
            card: false,
        })
    }

    pub fn card(photo: Option<String>, text: impl Into<String>, keyboard: Keyboard) -> Self {
        Effect::Send(Post {
            text: text.into(),
            keyboard: Some(keyboard),
            photo,
            card: true,
        })
    }

    pub fn toast(text: impl Into<String>) -> Self {
        Effect::Toast {
            text: text.into(),
            alert: false,
        }
    }
}

/// Where a flow goes after a handler ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next<S> {
    Stay,
    Goto(S),
    /// Conversation over; its context is cleared
    End,
}

impl<S> Next<S> {
    /// Translate a state into another flow's; states with no counterpart end the flow.
    pub fn map<T>(self, f: impl FnOnce(S) -> Option<T>) -> Next<T> {
        match self {
            Next::Stay => Next::Stay,
            Next::Goto(state) => f(state).map_or(Next::End, Next::Goto),
            Next::End => Next::End,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<S> {
    pub next: Next<S>,
    pub effects: Vec<Effect>,
}

impl<S> Outcome<S> {
    pub fn new(next: Next<S>) -> Self {
        Self {
            next,
            effects: vec![],
        }
    }

    pub fn stay() -> Self {
        Self::new(Next::Stay)
    }

    pub fn goto(state: S) -> Self {
        Self::new(Next::Goto(state))
    }

    pub fn end() -> Self {
        Self::new(Next::End)
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn map_state<T>(self, f: impl FnOnce(S) -> Option<T>) -> Outcome<T> {
        Outcome {
            next: self.next.map(f),
            effects: self.effects,
        }
    }
}
