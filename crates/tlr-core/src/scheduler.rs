//! One-shot deferred actions.
//!
//! A single timer loop owns a min-heap of `(fire_at, seq)` entries fed through a
//! channel and sleeps until the earliest deadline. Every due action runs on its
//! own task, so a failing or panicking action is logged and never affects the
//! loop or any other action. Actions fire at most once, are never retried, and
//! cannot be cancelled individually.

use std::{
    cmp::{Ordering as CmpOrdering, Reverse},
    collections::BinaryHeap,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{domain::MessageRef, errors::Error, messaging::port::MessagingPort, Result};

pub type DeferredFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;
type DeferredAction = Box<dyn FnOnce() -> DeferredFuture + Send + 'static>;

/// A deletion owned by the scheduler until it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeferredDeletion {
    pub target: MessageRef,
    pub fire_at: Instant,
    /// Wall-clock equivalent of `fire_at`, for logs.
    pub due_at: DateTime<Utc>,
}

struct ScheduledJob {
    fire_at: Instant,
    seq: u64,
    label: String,
    action: DeferredAction,
}

impl PartialEq for ScheduledJob {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for ScheduledJob {}

impl PartialOrd for ScheduledJob {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledJob {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.fire_at
            .cmp(&other.fire_at)
            .then(self.seq.cmp(&other.seq))
    }
}

#[derive(Clone)]
pub struct DeferredScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    tx: mpsc::UnboundedSender<ScheduledJob>,
    cancel: CancellationToken,
    pending: Arc<AtomicUsize>,
    next_seq: AtomicU64,
    timer_loop: Mutex<Option<JoinHandle<()>>>,
}

impl DeferredScheduler {
    /// Start the timer loop on the current tokio runtime.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let pending = Arc::new(AtomicUsize::new(0));

        let handle = tokio::spawn(timer_loop(rx, cancel.clone(), pending.clone()));

        Self {
            inner: Arc::new(SchedulerInner {
                tx,
                cancel,
                pending,
                next_seq: AtomicU64::new(0),
                timer_loop: Mutex::new(Some(handle)),
            }),
        }
    }

    /// Run `action` once, no earlier than `delay` from now.
    ///
    /// Returns the deadline. Errors if the scheduler was shut down or the
    /// deadline is not representable.
    pub fn schedule<F, Fut>(
        &self,
        label: impl Into<String>,
        delay: Duration,
        action: F,
    ) -> Result<Instant>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if self.inner.cancel.is_cancelled() {
            return Err(Error::SchedulerClosed);
        }

        let fire_at = Instant::now().checked_add(delay).ok_or_else(|| {
            Error::Validation(format!("delay of {}s is out of range", delay.as_secs()))
        })?;
        let job = ScheduledJob {
            fire_at,
            seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
            action: Box::new(move || -> DeferredFuture { Box::pin(action()) }),
        };

        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        if self.inner.tx.send(job).is_err() {
            self.inner.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::SchedulerClosed);
        }

        Ok(fire_at)
    }

    /// Delete `target` through `messenger` after `delay`; failures are logged.
    pub fn schedule_deletion(
        &self,
        messenger: Arc<dyn MessagingPort>,
        target: MessageRef,
        delay: Duration,
    ) -> Result<DeferredDeletion> {
        let due_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .ok_or_else(|| {
                Error::Validation(format!("delay of {}s is out of range", delay.as_secs()))
            })?;

        let fire_at = self.schedule(format!("delete {target}"), delay, move || async move {
            messenger.delete_message(target).await?;
            info!(
                chat_id = target.chat_id.0,
                message_id = target.message_id.0,
                "deleted message"
            );
            Ok(())
        })?;

        debug!(%target, %due_at, "deletion scheduled");

        Ok(DeferredDeletion {
            target,
            fire_at,
            due_at,
        })
    }

    /// Jobs accepted but not yet started.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Stop the timer loop. Jobs that have not fired yet are dropped; jobs
    /// already running are left to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handle = self
            .inner
            .timer_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("scheduler loop ended abnormally: {e}");
            }
        }
    }
}

async fn timer_loop(
    mut rx: mpsc::UnboundedReceiver<ScheduledJob>,
    cancel: CancellationToken,
    pending: Arc<AtomicUsize>,
) {
    let mut queue: BinaryHeap<Reverse<ScheduledJob>> = BinaryHeap::new();

    loop {
        let next_deadline = queue.peek().map(|Reverse(job)| job.fire_at);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Some(job) => queue.push(Reverse(job)),
                None => break,
            },
            _ = wait_until(next_deadline) => {
                let now = Instant::now();
                while queue.peek().is_some_and(|Reverse(job)| job.fire_at <= now) {
                    let Some(Reverse(job)) = queue.pop() else {
                        break;
                    };
                    pending.fetch_sub(1, Ordering::SeqCst);
                    tokio::spawn(run_job(job));
                }
            }
        }
    }

    // Jobs still buffered in the channel were never moved into the heap.
    rx.close();
    while let Ok(job) = rx.try_recv() {
        queue.push(Reverse(job));
    }
    if !queue.is_empty() {
        warn!(dropped = queue.len(), "scheduler stopped with pending jobs");
        pending.fetch_sub(queue.len(), Ordering::SeqCst);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn run_job(job: ScheduledJob) {
    let ScheduledJob {
        label, action, ..
    } = job;

    // Inner task so a panic surfaces as a JoinError we can log.
    match tokio::spawn(action()).await {
        Ok(Ok(())) => debug!(job = %label, "deferred action completed"),
        Ok(Err(e)) => warn!(job = %label, "deferred action failed: {e}"),
        Err(e) => error!(job = %label, "deferred action panicked: {e}"),
    }
}
