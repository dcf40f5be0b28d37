//! Webhook HTTP surface
//!
//! Telegram posts every update to `{prefix}/{token}`. Updates are handed to
//! the engine on their own task so the webhook answers immediately.

mod handlers;

pub use handlers::create_router;

use crate::runtime::Engine;
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState<G, C> {
    pub engine: Arc<Engine<G, C>>,
    /// Last path segment the webhook accepts
    pub token: Arc<str>,
}

impl<G, C> AppState<G, C> {
    pub fn new(engine: Arc<Engine<G, C>>, token: &str) -> Self {
        Self {
            engine,
            token: Arc::from(token),
        }
    }
}

impl<G, C> Clone for AppState<G, C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            token: Arc::clone(&self.token),
        }
    }
}
