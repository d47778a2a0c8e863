//! Single-job background worker
//!
//! Long-running work (synthesis, rendering) runs on a spawned task and talks
//! back to the presentation side through a [`JobEvent`] channel.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::ports::ProgressSink;

/// Messages published by a running job
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Started { label: String },
    Progress { fraction: f64, message: Option<String> },
    Warning(String),
    Finished,
    Failed(String),
}

/// Sending half of a job's event channel
#[derive(Clone)]
pub struct EventSender {
    tx: UnboundedSender<JobEvent>,
}

impl EventSender {
    /// Create a connected sender/receiver pair
    pub fn channel() -> (Self, UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: JobEvent) {
        // The receiver may already be gone; the job still runs to completion
        if self.tx.send(event).is_err() {
            debug!("Job event dropped: receiver closed");
        }
    }
}

impl ProgressSink for EventSender {
    fn progress(&self, fraction: f64, message: Option<String>) {
        self.send(JobEvent::Progress {
            fraction: fraction.clamp(0.0, 1.0),
            message,
        });
    }

    fn warning(&self, message: String) {
        self.send(JobEvent::Warning(message));
    }
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs at most one job at a time
#[derive(Default, Clone)]
pub struct JobRunner {
    busy: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Spawn `job`, refusing with [`DomainError::Busy`] while another is in flight.
    ///
    /// `Started` is sent before the job runs; `Finished` or `Failed` after it ends.
    pub fn spawn<F, T>(
        &self,
        label: impl Into<String>,
        events: EventSender,
        job: F,
    ) -> Result<JoinHandle<Result<T, DomainError>>, DomainError>
    where
        F: Future<Output = Result<T, DomainError>> + Send + 'static,
        T: Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DomainError::Busy);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        let label = label.into();
        events.send(JobEvent::Started {
            label: label.clone(),
        });

        Ok(tokio::spawn(async move {
            let _guard = guard;
            let result = job.await;
            match &result {
                Ok(_) => events.send(JobEvent::Finished),
                Err(e) => {
                    warn!("{} failed: {}", label, e);
                    events.send(JobEvent::Failed(e.to_string()));
                }
            }
            result
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_in_order() {
        let runner = JobRunner::new();
        let (events, mut rx) = EventSender::channel();
        let sink = events.clone();

        let handle = runner
            .spawn("count", events, async move {
                sink.progress(0.5, Some("half".to_string()));
                sink.warning("careful".to_string());
                Ok(7)
            })
            .unwrap();

        assert_eq!(handle.await.unwrap().unwrap(), 7);
        assert_eq!(
            rx.recv().await,
            Some(JobEvent::Started {
                label: "count".to_string()
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(JobEvent::Progress {
                fraction: 0.5,
                message: Some("half".to_string())
            })
        );
        assert_eq!(rx.recv().await, Some(JobEvent::Warning("careful".to_string())));
        assert_eq!(rx.recv().await, Some(JobEvent::Finished));
    }

    #[tokio::test]
    async fn test_second_job_is_refused() {
        let runner = JobRunner::new();
        let (events, _rx) = EventSender::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let first = runner
            .spawn("first", events.clone(), async move {
                let _ = release_rx.await;
                Ok(())
            })
            .unwrap();

        let second = runner.spawn("second", events.clone(), async { Ok(()) });
        assert!(matches!(second, Err(DomainError::Busy)));

        release_tx.send(()).unwrap();
        first.await.unwrap().unwrap();
        assert!(!runner.is_busy());
        assert!(runner.spawn("third", events, async { Ok(()) }).is_ok());
    }

    #[tokio::test]
    async fn test_failure_is_published() {
        let runner = JobRunner::new();
        let (events, mut rx) = EventSender::channel();

        let handle = runner
            .spawn("broken", events, async {
                Err::<(), _>(DomainError::Render("boom".to_string()))
            })
            .unwrap();

        assert!(handle.await.unwrap().is_err());
        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert_eq!(last, Some(JobEvent::Failed("Render failed: boom".to_string())));
    }
}
