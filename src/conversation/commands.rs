//! Commands outside the two flows: help, subscriptions and admin tools
//!
//! These never change flow state. Gateway failures become a one-line reply.

use std::sync::Arc;

use super::outcome::Effect;
use super::routes::GlobalCommand;
use super::turn::Turn;
use crate::gate::{BlockCache, MaintenanceMode, MaintenanceSource};
use crate::gateway::{BlockStatusUpdate, GatewayError};
use crate::render::text;

const MIN_BROADCAST_CHARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Maintenance,
    Block,
    Unblock,
    UserStatus,
    Broadcast,
    Help,
}

impl AdminCommand {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "maintenance" => AdminCommand::Maintenance,
            "block" => AdminCommand::Block,
            "unblock" => AdminCommand::Unblock,
            "userstatus" => AdminCommand::UserStatus,
            "broadcast_admin" => AdminCommand::Broadcast,
            "admin_commands" => AdminCommand::Help,
            _ => return None,
        })
    }
}

/// Shared state the admin commands operate on
#[derive(Clone)]
pub struct AdminControls {
    pub maintenance: Arc<dyn MaintenanceSource>,
    pub blocks: BlockCache,
}

pub async fn handle(command: GlobalCommand, turn: &mut Turn<'_>, admin: &AdminControls) -> Vec<Effect> {
    let reply = match command {
        GlobalCommand::Help => text::HELP.to_string(),
        GlobalCommand::Subscribe => subscribe(turn).await,
        GlobalCommand::Unsubscribe => unsubscribe(turn).await,
        GlobalCommand::Admin { command, args } => {
            if turn.elevated {
                tracing::info!(user_id = turn.actor(), ?command, "Admin command");
                admin_command(command, args.as_deref(), turn, admin).await
            } else {
                tracing::warn!(user_id = turn.actor(), ?command, "Admin command from non-admin");
                text::NOT_AUTHORIZED.to_string()
            }
        }
    };
    vec![Effect::send(reply, None)]
}

async fn subscribe(turn: &Turn<'_>) -> String {
    match turn.gateway.subscribe(turn.user).await {
        Ok(_) => text::SUBSCRIBED.to_string(),
        Err(e) => {
            tracing::warn!(user_id = turn.actor(), error = %e, "Subscribe failed");
            text::SUBSCRIBE_FAILED.to_string()
        }
    }
}

async fn unsubscribe(turn: &Turn<'_>) -> String {
    match turn.gateway.unsubscribe(turn.actor()).await {
        // unknown users are already unsubscribed
        Ok(_) => text::UNSUBSCRIBED.to_string(),
        Err(e) if e.is_not_found() => text::UNSUBSCRIBED.to_string(),
        Err(e) => {
            tracing::warn!(user_id = turn.actor(), error = %e, "Unsubscribe failed");
            text::UNSUBSCRIBE_FAILED.to_string()
        }
    }
}

async fn admin_command(
    command: AdminCommand,
    args: Option<&str>,
    turn: &Turn<'_>,
    admin: &AdminControls,
) -> String {
    match command {
        AdminCommand::Maintenance => maintenance(args, admin),
        AdminCommand::Block => {
            let Some((user, reason)) = args.and_then(split_target) else {
                return text::BLOCK_USAGE.to_string();
            };
            let update = BlockStatusUpdate {
                is_blocked: true,
                block_reason: reason.map(str::to_string),
            };
            match turn.gateway.set_block_status(user, &update, turn.actor()).await {
                Ok(status) => {
                    forget_block(admin, user);
                    text::blocked(user, status.block_reason.as_deref().or(reason))
                }
                Err(e) => failure("block user", &e),
            }
        }
        AdminCommand::Unblock => {
            let Some((user, None)) = args.and_then(split_target) else {
                return text::UNBLOCK_USAGE.to_string();
            };
            let update = BlockStatusUpdate {
                is_blocked: false,
                block_reason: None,
            };
            match turn.gateway.set_block_status(user, &update, turn.actor()).await {
                Ok(_) => {
                    forget_block(admin, user);
                    text::unblocked(user)
                }
                Err(e) => failure("unblock user", &e),
            }
        }
        AdminCommand::UserStatus => {
            let Some((user, None)) = args.and_then(split_target) else {
                return text::USER_STATUS_USAGE.to_string();
            };
            match turn.gateway.user_status(user, turn.actor()).await {
                Ok(status) => text::user_status_card(&status),
                Err(e) => failure("fetch user status", &e),
            }
        }
        AdminCommand::Broadcast => {
            let Some(message) = args else {
                return text::BROADCAST_USAGE.to_string();
            };
            let message = message.replace("\\n", "\n");
            if message.trim().chars().count() < MIN_BROADCAST_CHARS {
                return text::BROADCAST_TOO_SHORT.to_string();
            }
            match turn.gateway.enqueue_broadcast(&message, turn.actor()).await {
                Ok(receipt) => text::broadcast_queued(&receipt.task_id),
                Err(e) => failure("queue broadcast", &e),
            }
        }
        AdminCommand::Help => text::ADMIN_HELP.to_string(),
    }
}

fn maintenance(args: Option<&str>, admin: &AdminControls) -> String {
    let Some(args) = args else {
        return match admin.maintenance.maintenance_state() {
            Ok(mode) => text::maintenance_status(&mode),
            Err(e) => format!("⚠️ Could not read maintenance flag: {}", text::escape(&e.to_string())),
        };
    };

    let (option, message) = args
        .split_once(char::is_whitespace)
        .map_or((args, None), |(o, m)| (o, Some(m.trim())));
    let mode = match (option.to_ascii_lowercase().as_str(), message) {
        ("off", _) => MaintenanceMode::Off,
        ("stealth", _) | ("on", None) => MaintenanceMode::Stealth,
        ("on", Some(message)) if !message.is_empty() => MaintenanceMode::Message(message.to_string()),
        ("on", Some(_)) => MaintenanceMode::Message(text::DEFAULT_MAINTENANCE_MESSAGE.to_string()),
        _ => return text::MAINTENANCE_USAGE.to_string(),
    };

    match admin.maintenance.set_maintenance_state(&mode) {
        Ok(()) => {
            tracing::info!(?mode, "Maintenance mode changed");
            text::maintenance_changed(&mode)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to write maintenance flag");
            format!("❌ Could not update maintenance flag: {}", text::escape(&e.to_string()))
        }
    }
}

/// `<user> [rest]` split into the target user and an optional remainder.
fn split_target(args: &str) -> Option<(&str, Option<&str>)> {
    let args = args.trim();
    if args.is_empty() {
        return None;
    }
    Some(match args.split_once(char::is_whitespace) {
        Some((user, rest)) => (user, Some(rest.trim()).filter(|r| !r.is_empty())),
        None => (args, None),
    })
}

fn forget_block(admin: &AdminControls, user: &str) {
    if let Ok(user_id) = user.parse::<i64>() {
        admin.blocks.forget(user_id);
    }
}

fn failure(action: &str, e: &GatewayError) -> String {
    tracing::warn!(error = %e, action, "Admin command failed");
    if e.is_not_found() {
        text::admin_action_failed(action, "user not found")
    } else {
        text::admin_action_failed(action, &e.message)
    }
}
