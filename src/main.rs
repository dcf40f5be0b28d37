//! Gradiator - Telegram bot for browsing historical grade distributions
//!
//! A webhook server driving a conversational navigation engine over a
//! remote grades service.

mod api;
mod channel;
mod config;
mod conversation;
mod flags;
mod gate;
mod gateway;
mod render;
mod runtime;
mod session;

use api::{create_router, AppState};
use channel::TelegramChannel;
use config::BotConfig;
use conversation::AdminControls;
use flags::FlagStore;
use gate::{BlockCache, ElevatedIds, Gatekeeper, MaintenanceSource};
use gateway::HttpGateway;
use runtime::{spawn_worker, Engine, EngineSettings, DEFAULT_QUEUE_CAPACITY};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional .env; real environment wins
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradiator=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    let config = BotConfig::from_env()?;
    if config.admin_ids.is_empty() {
        tracing::warn!("TELEGRAM_ADMIN_IDS is empty; admin commands are unavailable");
    }

    tracing::info!(path = %config.flags_db.display(), "Opening flag store");
    let flags = Arc::new(FlagStore::open(&config.flags_db)?);
    if let Some(mode) = &config.startup_maintenance {
        flags.set_maintenance_state(mode)?;
        tracing::info!(?mode, "Applied startup maintenance mode");
    }

    let gateway = Arc::new(HttpGateway::new(&config.api_base_url, config.api_timeout)?);
    let channel = Arc::new(TelegramChannel::new(&config.token, config.api_timeout)?);

    match config.webhook_url() {
        Some(url) => {
            channel.set_webhook(&url).await?;
            tracing::info!(prefix = %config.route_prefix(), "Webhook registered");
        }
        None => tracing::warn!("PUBLIC_DOMAIN not set; skipping webhook registration"),
    }

    let cancel = CancellationToken::new();
    let (worker, worker_task) = spawn_worker(
        gateway.clone(),
        channel.clone(),
        DEFAULT_QUEUE_CAPACITY,
        cancel.clone(),
    );

    let blocks = BlockCache::new(config.block_cache_ttl);
    let gate = Gatekeeper::new(
        ElevatedIds::new(config.admin_ids.iter().copied()),
        flags.clone(),
        gateway.clone(),
        blocks.clone(),
    );
    let admin = AdminControls {
        maintenance: flags,
        blocks,
    };
    let settings = EngineSettings {
        admin_channel: config.admin_channel,
        ..EngineSettings::default()
    };
    let engine = Arc::new(Engine::new(gate, gateway, channel, worker, admin, settings));

    let sweeper = tokio::spawn(sweep_sessions(engine.clone(), cancel.clone()));

    let app = create_router(
        AppState::new(engine, &config.token),
        &config.route_prefix(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Gradiator listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    let (worker_done, sweeper_done) = tokio::join!(worker_task, sweeper);
    if let Err(e) = worker_done.and(sweeper_done) {
        tracing::warn!(error = %e, "Background task ended abnormally");
    }
    tracing::info!("Shut down");
    Ok(())
}

/// Periodically drop sessions whose flows have all timed out.
async fn sweep_sessions<G, C>(engine: Arc<Engine<G, C>>, cancel: CancellationToken)
where
    G: gateway::DataGateway,
    C: channel::Channel,
{
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let expired = engine.sessions().sweep(engine.settings().timeouts).await;
                if expired > 0 {
                    tracing::debug!(expired, "Swept idle conversations");
                }
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
