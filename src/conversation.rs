//! Conversation engine
//!
//! Two independent flows (browse and feedback) driven by closed state enums.
//! Routing picks one action per event; handlers return an `Outcome` whose
//! effects the runtime performs before the next state is applied.

mod backtrack;
mod browse;
mod commands;
mod error;
mod feedback;
mod outcome;
mod routes;
mod state;
mod turn;

#[cfg(test)]
mod scenarios;

pub use commands::AdminControls;
pub use outcome::{Effect, Next, Outcome, Post};
pub use routes::{route, Route, Trigger};
pub use state::{BrowseState, FeedbackState, Flow};
pub use turn::Turn;

use crate::render::text;

/// Run the action chosen for this event and fold its outcome into the session.
///
/// Handler errors are converted here; nothing a handler does escapes as an error.
pub async fn run(route: Route, turn: &mut Turn<'_>, admin: &AdminControls) {
    match route {
        Route::Start => {
            let outcome = browse::start(turn);
            apply_browse(outcome, turn).await;
        }
        Route::Cancel => {
            let outcome = browse::cancel(turn);
            apply_browse(outcome, turn).await;
        }
        Route::Browse(action) => {
            let outcome = match browse::handle(action, turn).await {
                Ok(outcome) => outcome,
                Err(e) => e.recover(turn),
            };
            apply_browse(outcome, turn).await;
        }
        Route::Feedback(action) => {
            let outcome = match feedback::handle(action, turn).await {
                Ok(outcome) => outcome,
                // recovery never leads into a feedback state
                Err(e) => e.recover(turn).map_state(|_| None),
            };
            for effect in outcome.effects {
                turn.emit(effect).await;
            }
            turn.session.advance_feedback(outcome.next);
        }
        Route::Global(command) => {
            for effect in commands::handle(command, turn, admin).await {
                turn.emit(effect).await;
            }
        }
        Route::Ignored => {
            tracing::debug!(
                user_id = turn.actor(),
                browse = ?turn.session.browse_state(),
                feedback = ?turn.session.feedback_state(),
                "Event not accepted in current state"
            );
        }
        Route::Expired => {
            tracing::debug!(user_id = turn.actor(), "Button from an inactive conversation");
            turn.emit(Effect::toast(text::MENU_EXPIRED)).await;
        }
    }
}

async fn apply_browse(outcome: Outcome<BrowseState>, turn: &mut Turn<'_>) {
    for effect in outcome.effects {
        turn.emit(effect).await;
    }
    turn.session.advance_browse(outcome.next);
}
