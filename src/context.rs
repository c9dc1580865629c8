//! Request contexts carrying a deadline and a cancellation signal.
//!
//! A [`RequestContext`] is handed to every transport call. Cancellation is
//! signalled by disconnecting a channel: the [`CancelHandle`] owns the only
//! sender, and dropping it wakes every receiver that is blocked in a
//! `select!`. Deadlines are exposed as `crossbeam_channel::at` timers so the
//! same `select!` can wait on both without polling.
//!
//! A nested context merges its own signal with its parent's through a relay
//! thread, which only matters to `select!`. [`RequestContext::err`] instead
//! checks the receiver of every cancellable ancestor directly, so it reports
//! cancellation as soon as [`CancelHandle::cancel`] returns.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::FetchError;

/// Deadline and cancellation state for one logical operation.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use forgefetch::context::RequestContext;
///
/// let (ctx, cancel) = RequestContext::background().with_cancel();
/// let child = ctx.child_with_timeout(Duration::from_secs(5));
/// assert!(child.err().is_none());
///
/// cancel.cancel();
/// assert!(child.err().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancelled: Option<Receiver<()>>,
    lineage: Vec<Receiver<()>>,
}

impl RequestContext {
    /// A context that never expires and cannot be cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().child_with_timeout(timeout)
    }

    /// Derive a child that expires at `deadline` or at the parent's deadline,
    /// whichever is earlier. Cancellation of the parent propagates.
    #[must_use]
    pub fn child_with_deadline(&self, deadline: Instant) -> Self {
        let capped = self
            .deadline
            .filter(|existing| *existing < deadline)
            .unwrap_or(deadline);
        Self {
            deadline: Some(capped),
            cancelled: self.cancelled.clone(),
            lineage: self.lineage.clone(),
        }
    }

    /// Derive a child that expires `timeout` from now, capped by the parent.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or_else(|| self.clone(), |deadline| self.child_with_deadline(deadline))
    }

    /// Derive a cancellable child and the handle that cancels it.
    ///
    /// Cancelling the returned handle does not affect the parent.
    #[must_use]
    pub fn with_cancel(self) -> (Self, CancelHandle) {
        let (sender, receiver) = crossbeam_channel::bounded::<()>(0);
        let handle = CancelHandle {
            sender: Arc::new(Mutex::new(Some(sender))),
            parent: self.cancelled,
        };
        let mut lineage = self.lineage;
        lineage.push(receiver.clone());
        let ctx = Self {
            deadline: self.deadline,
            cancelled: Some(handle.forward(receiver)),
            lineage,
        };
        (ctx, handle)
    }

    /// The instant after which operations under this context must stop.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, or `None` when there is no deadline.
    ///
    /// Returns `Some(Duration::ZERO)` once the deadline has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// The reason this context is done, or `None` while it is still live.
    ///
    /// Explicit cancellation takes precedence over an elapsed deadline.
    #[must_use]
    pub fn err(&self) -> Option<FetchError> {
        let cancelled = self
            .lineage
            .iter()
            .any(|receiver| matches!(receiver.try_recv(), Err(TryRecvError::Disconnected)));
        if cancelled {
            return Some(FetchError::Cancelled);
        }
        self.deadline
            .filter(|deadline| Instant::now() >= *deadline)
            .map(|_| FetchError::DeadlineExceeded)
    }

    /// A receiver that disconnects when the context is cancelled.
    ///
    /// Never fires for contexts without a cancellation handle.
    #[must_use]
    pub fn cancel_signal(&self) -> Receiver<()> {
        self.cancelled
            .clone()
            .unwrap_or_else(crossbeam_channel::never)
    }

    /// A receiver that delivers a message once the deadline passes.
    ///
    /// Never fires for contexts without a deadline.
    #[must_use]
    pub fn deadline_signal(&self) -> Receiver<Instant> {
        self.deadline
            .map_or_else(crossbeam_channel::never, crossbeam_channel::at)
    }
}

/// Cancels the [`RequestContext`] it was created with, and every child
/// derived from it.
///
/// Dropping the last clone of a handle also cancels the context, so keep
/// the handle alive for as long as the operation should run.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    parent: Option<Receiver<()>>,
}

impl CancelHandle {
    /// Cancel the associated context. Idempotent.
    pub fn cancel(&self) {
        let mut guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        guard.take();
    }

    /// Returns true once [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Link a parent's cancellation to this handle.
    ///
    /// When the parent is itself cancellable, a watcher thread waits for
    /// either signal and disconnects the child's channel when the parent
    /// fires. The watcher exits as soon as either side is cancelled or the
    /// child handle is dropped.
    fn forward(&self, own: Receiver<()>) -> Receiver<()> {
        let Some(parent) = self.parent.clone() else {
            return own;
        };
        let (relay_tx, relay_rx) = crossbeam_channel::bounded::<()>(0);
        let watched = own.clone();
        std::thread::spawn(move || {
            crossbeam_channel::select! {
                recv(parent) -> _ => {}
                recv(watched) -> _ => {}
            }
            drop(relay_tx);
        });
        relay_rx
    }
}
