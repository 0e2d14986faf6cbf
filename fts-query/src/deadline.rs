//! Deadlines and cancellation for in-flight search calls
//!
//! Every suspension point of an operator (dispatch, each hit) runs through
//! [`race`], which resolves with the first of: the work completing, the
//! deadline passing, or the enclosing query cancelling.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Absolute deadline, started when a request is dispatched
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    at: Option<Instant>,
}

impl Deadline {
    /// Start now; `None` never expires
    pub fn start(timeout: Option<Duration>) -> Self {
        let started = Instant::now();
        Self {
            started,
            at: timeout.map(|t| started + t),
        }
    }

    pub fn unbounded() -> Self {
        Self::start(None)
    }

    pub fn at(&self) -> Option<Instant> {
        self.at
    }

    pub fn is_bounded(&self) -> bool {
        self.at.is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// How a raced future ended
#[derive(Debug)]
pub enum Outcome<T> {
    Ready(T),
    Expired,
    Cancelled,
}

/// Drive `fut` until it completes, the deadline passes or `cancel` fires.
///
/// Cancellation wins ties.
pub async fn race<F>(deadline: &Deadline, cancel: &mut CancelToken, fut: F) -> Outcome<F::Output>
where
    F: Future,
{
    let timed = async {
        match deadline.at() {
            Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
            None => Some(fut.await),
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Outcome::Cancelled,
        result = timed => match result {
            Some(value) => Outcome::Ready(value),
            None => Outcome::Expired,
        },
    }
}

/// Create a connected cancel handle and token
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelToken { rx })
}

/// Held by the enclosing query; cancelling reaches every token clone
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observed by operators
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; pends forever if the handle is dropped first
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}
