// ── Action dispatcher ──
//
// Runs user-triggered mutations one at a time. The idle-to-pending check
// and the pending write happen under the watch channel's lock, so two
// racing dispatches cannot both proceed. A successful action schedules
// one delayed refresh of the owning view so the backend can settle first.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::poller::PollHandle;

/// Delay between a successful action and the follow-up view refresh.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Result of the most recent completed action, kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success(String),
    Error(String),
}

impl ActionOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Observable dispatcher state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionState {
    /// Name of the action in flight, if any.
    pub pending: Option<String>,
    pub last: Option<ActionOutcome>,
}

impl ActionState {
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }
}

/// What a call to [`ActionDispatcher::dispatch`] did.
#[derive(Debug)]
pub enum Dispatch {
    /// The operation ran and succeeded with this message.
    Succeeded(String),
    /// The operation ran and failed. Not retried.
    Failed(CoreError),
    /// Another action was in flight; the operation was never invoked.
    Busy,
}

impl Dispatch {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

// ── ActionDispatcher ────────────────────────────────────────────────

/// Serializes actions for one view. Cheap to clone; clones share state.
///
/// Pending settle refreshes are cancelled when the last clone is dropped
/// or [`shutdown`](Self::shutdown) is called.
#[derive(Clone)]
pub struct ActionDispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    state: watch::Sender<ActionState>,
    settle_delay: Duration,
    refresh: Option<PollHandle>,
    cancel: CancellationToken,
}

impl Drop for DispatcherInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl ActionDispatcher {
    pub fn new(settle_delay: Duration) -> Self {
        Self::build(settle_delay, None)
    }

    /// A dispatcher that refreshes `view` after every successful action.
    pub fn with_refresh(settle_delay: Duration, view: PollHandle) -> Self {
        Self::build(settle_delay, Some(view))
    }

    fn build(settle_delay: Duration, refresh: Option<PollHandle>) -> Self {
        let (state, _) = watch::channel(ActionState::default());
        Self {
            inner: Arc::new(DispatcherInner {
                state,
                settle_delay,
                refresh,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn state(&self) -> ActionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActionState> {
        self.inner.state.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.state.borrow().is_busy()
    }

    /// Run `op` unless another action is pending.
    ///
    /// `op` yields the backend's confirmation message. The operation is
    /// passed through untouched: whether it *should* run is the caller's
    /// call, not the dispatcher's.
    pub async fn dispatch<F, Fut>(&self, name: &str, op: F) -> Dispatch
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, CoreError>>,
    {
        let claimed = self.inner.state.send_if_modified(|s| {
            if s.pending.is_some() {
                return false;
            }
            s.pending = Some(name.to_owned());
            s.last = None;
            true
        });
        if !claimed {
            debug!(action = name, "another action is pending; ignoring");
            return Dispatch::Busy;
        }

        let guard = PendingGuard {
            state: &self.inner.state,
            armed: true,
        };
        let result = op().await;
        guard.disarm();

        let (outcome, dispatch) = match result {
            Ok(message) => {
                info!(action = name, %message, "action succeeded");
                (
                    ActionOutcome::Success(message.clone()),
                    Dispatch::Succeeded(message),
                )
            }
            Err(e) => {
                warn!(action = name, error = %e, "action failed");
                (ActionOutcome::Error(e.to_string()), Dispatch::Failed(e))
            }
        };

        let succeeded = outcome.is_success();
        self.inner.state.send_modify(|s| {
            s.pending = None;
            s.last = Some(outcome);
        });

        if succeeded {
            self.schedule_refresh();
        }
        dispatch
    }

    /// Forget the last outcome (e.g. once the user dismissed it).
    pub fn clear_outcome(&self) {
        self.inner.state.send_if_modified(|s| s.last.take().is_some());
    }

    /// Cancel pending settle refreshes.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    fn schedule_refresh(&self) {
        let Some(view) = self.inner.refresh.clone() else {
            return;
        };
        let cancel = self.inner.cancel.clone();
        let delay = self.inner.settle_delay;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => view.refresh(),
            }
        });
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("state", &*self.inner.state.borrow())
            .field("settle_delay", &self.inner.settle_delay)
            .finish_non_exhaustive()
    }
}

/// Clears `pending` if the dispatching future is dropped mid-operation.
struct PendingGuard<'a> {
    state: &'a watch::Sender<ActionState>,
    armed: bool,
}

impl PendingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|s| s.pending = None);
        }
    }
}
