//! Feedback flow handlers

use super::error::{HandlerError, HandlerResult};
use super::outcome::{Effect, Outcome};
use super::routes::FeedbackAction;
use super::turn::Turn;
use super::FeedbackState;
use crate::gateway::FeedbackSubmission;
use crate::render::keyboards::{feedback_confirm, feedback_entry, feedback_types};
use crate::render::text;
use crate::runtime::Job;
use crate::session::{FeedbackKind, FeedbackSlots};

pub async fn handle(action: FeedbackAction, turn: &mut Turn<'_>) -> HandlerResult<FeedbackState> {
    match action {
        FeedbackAction::Begin => {
            let previous = std::mem::take(turn.feedback()).surface;
            Ok(Outcome::goto(FeedbackState::AskFeedbackType)
                .with_effects(previous.map(|s| Effect::StripButtons(s.message)))
                .with_effect(Effect::send(text::FEEDBACK_INTRO, Some(feedback_types()))))
        }
        FeedbackAction::ChooseKind(kind) => Ok(choose_kind(kind, turn)),
        FeedbackAction::Message(message) => message_received(message, turn),
        FeedbackAction::Confirm => confirm(turn).await,
        FeedbackAction::ChangeType => {
            let slots = turn.feedback();
            *slots = FeedbackSlots {
                surface: slots.surface,
                ..FeedbackSlots::default()
            };
            Ok(Outcome::goto(FeedbackState::AskFeedbackType)
                .with_effect(Effect::show(text::FEEDBACK_INTRO, feedback_types())))
        }
    }
}

fn choose_kind(kind: FeedbackKind, turn: &mut Turn<'_>) -> Outcome<FeedbackState> {
    let slots = turn.feedback();
    slots.kind = Some(kind);
    slots.message = None;
    Outcome::goto(FeedbackState::TypingFeedbackMessage)
        .with_effect(Effect::show(text::feedback_type_chosen(kind), feedback_entry()))
}

fn message_received(message: String, turn: &mut Turn<'_>) -> HandlerResult<FeedbackState> {
    if message.trim().is_empty() {
        return Err(HandlerError::validation(text::FEEDBACK_EMPTY, feedback_entry()));
    }
    let kind = turn
        .feedback()
        .kind
        .ok_or_else(|| HandlerError::stale("feedback type", None))?;

    let preview = text::feedback_preview(kind, &message);
    turn.feedback().message = Some(message);

    Ok(Outcome::goto(FeedbackState::ConfirmFeedbackSubmission)
        .with_effects(turn.surface().map(|s| Effect::StripButtons(s.message)))
        .with_effect(Effect::send(preview, Some(feedback_confirm()))))
}

async fn confirm(turn: &mut Turn<'_>) -> HandlerResult<FeedbackState> {
    let slots = turn.feedback().clone();
    let (Some(kind), Some(message)) = (slots.kind, slots.message) else {
        tracing::warn!(user_id = turn.actor(), "Feedback confirmed without a stored message");
        return Ok(Outcome::end().with_effect(Effect::show_text(text::FEEDBACK_MISSING)));
    };

    turn.progress(text::FEEDBACK_SUBMITTING).await;
    let submission = FeedbackSubmission {
        telegram_user_id: turn.actor(),
        feedback_type: kind.api_value().to_string(),
        message_text: message.clone(),
        username: turn.user.username.clone(),
    };
    let receipt = turn.gateway.submit_feedback(&submission).await?;
    tracing::info!(
        user_id = turn.actor(),
        feedback_id = receipt.id,
        kind = kind.api_value(),
        "Feedback submitted"
    );

    let notify = turn.settings.admin_channel.map(|chat_id| {
        let full_name = [turn.user.first_name.as_deref(), turn.user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        Effect::Submit(Job::Notify {
            chat_id,
            text: text::admin_feedback_notice(
                kind,
                turn.actor(),
                &full_name,
                turn.user.username.as_deref(),
                &message,
            ),
        })
    });

    Ok(Outcome::end()
        .with_effect(Effect::show_text(text::FEEDBACK_THANKS))
        .with_effects(notify))
}
