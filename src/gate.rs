//! Gating filters
//!
//! Runs before any conversation routing. Elevated users always pass; everyone
//! else is checked against the maintenance toggle and then the block list.
//! Both checks fail open: a flag store or gateway hiccup must not lock users out.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::flags::FlagResult;
use crate::gateway::DataGateway;

/// Maintenance toggle as stored in the shared flag store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceMode {
    Off,
    /// Drop non-elevated traffic without a reply
    Stealth,
    /// Reply with this text and drop
    Message(String),
}

impl MaintenanceMode {
    /// Interpret a raw flag value. Absent, `false` and `off` are off; `true` and
    /// `stealth` are stealth; anything else is the message shown to users.
    pub fn from_flag_value(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("" | "false" | "off") => MaintenanceMode::Off,
            Some("true" | "stealth") => MaintenanceMode::Stealth,
            Some(message) => MaintenanceMode::Message(message.to_string()),
        }
    }

    pub fn to_flag_value(&self) -> String {
        match self {
            MaintenanceMode::Off => "false".to_string(),
            MaintenanceMode::Stealth => "stealth".to_string(),
            MaintenanceMode::Message(message) => message.clone(),
        }
    }
}

/// Synchronous access to the external maintenance toggle
pub trait MaintenanceSource: Send + Sync {
    fn maintenance_state(&self) -> FlagResult<MaintenanceMode>;

    fn set_maintenance_state(&self, mode: &MaintenanceMode) -> FlagResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    SilentDrop,
    /// Plain-text notice; the caller escapes or truncates it for its delivery path
    ReplyAndDrop(String),
}

/// Identifiers exempt from every gate
#[derive(Debug, Clone, Default)]
pub struct ElevatedIds(HashSet<i64>);

impl ElevatedIds {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn is_elevated(&self, user_id: i64) -> bool {
        self.0.contains(&user_id)
    }
}

/// Short-lived memory of block lookups, shared with the admin commands that change them
#[derive(Clone)]
pub struct BlockCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<i64, (bool, Instant)>>>,
}

impl BlockCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn get(&self, user_id: i64) -> Option<bool> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self.entries.lock().ok()?;
        entries
            .get(&user_id)
            .filter(|(_, at)| at.elapsed() < self.ttl)
            .map(|(blocked, _)| *blocked)
    }

    fn put(&self, user_id: i64, blocked: bool) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(user_id, (blocked, Instant::now()));
        }
    }

    pub fn forget(&self, user_id: i64) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&user_id);
        }
    }
}

pub struct Gatekeeper<G> {
    elevated: ElevatedIds,
    maintenance: Arc<dyn MaintenanceSource>,
    gateway: G,
    blocks: BlockCache,
}

impl<G: DataGateway> Gatekeeper<G> {
    pub fn new(
        elevated: ElevatedIds,
        maintenance: Arc<dyn MaintenanceSource>,
        gateway: G,
        blocks: BlockCache,
    ) -> Self {
        Self {
            elevated,
            maintenance,
            gateway,
            blocks,
        }
    }

    pub fn is_elevated(&self, user_id: i64) -> bool {
        self.elevated.is_elevated(user_id)
    }

    /// Decide whether an event from `user_id` may reach the conversation engine.
    pub async fn check(&self, user_id: Option<i64>) -> GateDecision {
        let Some(user_id) = user_id else {
            return GateDecision::Allow;
        };
        if self.is_elevated(user_id) {
            return GateDecision::Allow;
        }

        match self.maintenance.maintenance_state() {
            Ok(MaintenanceMode::Off) => {}
            Ok(MaintenanceMode::Stealth) => {
                tracing::debug!(user_id, "Maintenance (stealth): dropping event");
                return GateDecision::SilentDrop;
            }
            Ok(MaintenanceMode::Message(message)) => {
                tracing::debug!(user_id, "Maintenance: replying and dropping event");
                return GateDecision::ReplyAndDrop(format!("🚧 {message}"));
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Maintenance flag unreadable; allowing event");
            }
        }

        if self.is_blocked(user_id).await {
            tracing::info!(user_id, "Blocked user: dropping event");
            return GateDecision::SilentDrop;
        }
        GateDecision::Allow
    }

    async fn is_blocked(&self, user_id: i64) -> bool {
        if let Some(blocked) = self.blocks.get(user_id) {
            return blocked;
        }
        match self
            .gateway
            .user_status(&user_id.to_string(), user_id)
            .await
        {
            Ok(status) => {
                self.blocks.put(user_id, status.is_blocked);
                status.is_blocked
            }
            Err(e) if e.is_not_found() => {
                self.blocks.put(user_id, false);
                false
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    error = %e,
                    transient = e.kind.is_transient(),
                    "Block status check failed; allowing event"
                );
                false
            }
        }
    }
}
