//! Supervised background worker
//!
//! Side effects nobody waits for: the subscription touch on /start and the
//! admin-channel feedback notice. Jobs go over a bounded queue; a full queue
//! drops the job with a warning instead of blocking the reply path.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::channel::{Channel, ChatId};
use crate::gateway::{DataGateway, UserProfile};

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Create or refresh the user's subscription record
    Subscribe(UserProfile),
    /// Post a message to a chat other than the user's
    Notify { chat_id: ChatId, text: String },
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::Subscribe(_) => "subscribe",
            Job::Notify { .. } => "notify",
        }
    }
}

/// Sending half of the job queue
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<Job>,
}

impl WorkerHandle {
    /// Queue `job` without waiting. Never fails the caller.
    pub fn submit(&self, job: Job) {
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                tracing::warn!(job = job.name(), "Worker queue full; dropping job");
            }
            Err(TrySendError::Closed(job)) => {
                tracing::warn!(job = job.name(), "Worker stopped; dropping job");
            }
        }
    }

    /// Handle whose jobs land in the returned receiver instead of a worker.
    #[cfg(test)]
    pub fn detached(capacity: usize) -> (Self, mpsc::Receiver<Job>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

pub struct BackgroundWorker<G, C> {
    gateway: G,
    channel: C,
    rx: mpsc::Receiver<Job>,
    cancel: CancellationToken,
}

impl<G: DataGateway, C: Channel> BackgroundWorker<G, C> {
    async fn run(mut self) {
        tracing::info!("Background worker started");
        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    tracing::info!("Background worker stopping");
                    break;
                }

                job = self.rx.recv() => match job {
                    Some(job) => self.process(job).await,
                    None => break,
                }
            }
        }
    }

    async fn process(&self, job: Job) {
        let name = job.name();
        let result = match job {
            Job::Subscribe(profile) => self
                .gateway
                .subscribe(&profile)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Job::Notify { chat_id, text } => self
                .channel
                .send_message(chat_id, &text, None)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        };
        match result {
            Ok(()) => tracing::debug!(job = name, "Job completed"),
            Err(error) => tracing::warn!(job = name, %error, "Job failed"),
        }
    }
}

/// Start the worker on its own task. It runs until `cancel` fires or every handle is dropped.
pub fn spawn_worker<G, C>(
    gateway: G,
    channel: C,
    capacity: usize,
    cancel: CancellationToken,
) -> (WorkerHandle, JoinHandle<()>)
where
    G: DataGateway + 'static,
    C: Channel + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);
    let worker = BackgroundWorker {
        gateway,
        channel,
        rx,
        cancel,
    };
    (WorkerHandle { tx }, tokio::spawn(worker.run()))
}
