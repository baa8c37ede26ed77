// ── Polling view-model ──
//
// One background task per view: fetch on mount, then on every interval
// tick or manual refresh request. The task owns all fetching, so fetches
// never overlap; ticks and refresh requests that arrive mid-fetch collapse
// into a single follow-up. Teardown cancels the task and discards any
// in-flight result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use crate::error::CoreError;

// ── ViewState ───────────────────────────────────────────────────────

/// Snapshot of one polled view.
///
/// `data` is replaced wholesale on success and left untouched on failure,
/// so a failing backend still shows the last good snapshot next to the
/// error.
#[derive(Debug)]
pub struct ViewState<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    /// Why the last fetch failed; cleared by the next success.
    pub error: Option<CoreError>,
    /// The last failure was a 401; the session is gone.
    pub session_expired: bool,
    pub last_updated: Option<DateTime<Utc>>,
    /// Number of fetch results applied so far (successes and failures).
    pub generation: u64,
}

impl<T> ViewState<T> {
    fn initial() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
            session_expired: false,
            last_updated: None,
            generation: 0,
        }
    }

    fn apply(&mut self, result: Result<T, CoreError>) {
        match result {
            Ok(data) => {
                self.data = Some(Arc::new(data));
                self.error = None;
                self.session_expired = false;
                self.last_updated = Some(Utc::now());
            }
            Err(e) => {
                self.session_expired = e.is_session_expired();
                self.error = Some(e);
            }
        }
        self.loading = false;
        self.generation += 1;
    }

    /// `true` once at least one fetch has completed.
    pub fn is_settled(&self) -> bool {
        self.generation > 0
    }
}

impl<T> Clone for ViewState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            session_expired: self.session_expired,
            last_updated: self.last_updated,
            generation: self.generation,
        }
    }
}

// ── PollHandle ──────────────────────────────────────────────────────

/// Cloneable trigger for a poller's refresh. Outlives nothing: once the
/// poller is torn down, `refresh` is a no-op.
#[derive(Debug, Clone)]
pub struct PollHandle {
    refresh: Arc<Notify>,
    cancel: CancellationToken,
}

impl PollHandle {
    /// Request an immediate fetch, independent of the timer phase.
    pub fn refresh(&self) {
        if !self.cancel.is_cancelled() {
            self.refresh.notify_one();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

// ── Poller ──────────────────────────────────────────────────────────

/// A view-model that keeps a `ViewState<T>` in sync with the backend.
///
/// Dropping the poller tears it down.
pub struct Poller<T> {
    state: watch::Receiver<ViewState<T>>,
    handle: PollHandle,
    _guard: DropGuard,
}

impl<T: Send + Sync + 'static> Poller<T> {
    /// Mount a view: fetch immediately, then every `interval` if given.
    ///
    /// `interval: None` fetches on mount only; later fetches happen on
    /// [`refresh`](Self::refresh) or a dispatcher's settle refresh.
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(fetch: F, interval: Option<Duration>) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let (state_tx, state) = watch::channel(ViewState::initial());
        let refresh = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        tokio::spawn(poll_task(
            fetch,
            interval,
            state_tx,
            Arc::clone(&refresh),
            cancel.clone(),
        ));

        Self {
            state,
            handle: PollHandle {
                refresh,
                cancel: cancel.clone(),
            },
            _guard: cancel.drop_guard(),
        }
    }

    /// Latest snapshot.
    pub fn state(&self) -> ViewState<T> {
        self.state.borrow().clone()
    }

    /// Observe every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState<T>> {
        self.state.clone()
    }

    /// Snapshots as a `Stream`, starting with the current one.
    pub fn stream(&self) -> WatchStream<ViewState<T>> {
        WatchStream::new(self.state.clone())
    }

    pub fn refresh(&self) {
        self.handle.refresh();
    }

    /// Refresh trigger that can be handed to other components.
    pub fn handle(&self) -> PollHandle {
        self.handle.clone()
    }

    /// Wait for the next applied fetch result after the current one.
    pub async fn next_result(&self) -> Option<ViewState<T>> {
        let mut rx = self.state.clone();
        let seen = rx.borrow_and_update().generation;
        let state = rx.wait_for(|s| s.generation > seen).await.ok()?.clone();
        Some(state)
    }

    /// Wait until the first fetch has been applied.
    pub async fn settled(&self) -> Option<ViewState<T>> {
        let mut rx = self.state.clone();
        let state = rx.wait_for(ViewState::is_settled).await.ok()?.clone();
        Some(state)
    }

    /// Tear down: stop the timer and discard any in-flight fetch.
    pub fn shutdown(&self) {
        self.handle.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.cancel.is_cancelled()
    }
}

// ── Background task ─────────────────────────────────────────────────

async fn poll_task<T, F, Fut>(
    fetch: F,
    interval: Option<Duration>,
    state: watch::Sender<ViewState<T>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut ticker = interval.map(|period| {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    loop {
        if !run_fetch(&fetch, &state, &cancel).await {
            break;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = refresh.notified() => debug!("manual refresh"),
            () = next_tick(ticker.as_mut()) => {}
        }
    }

    debug!("poller stopped");
}

/// One fetch. Returns `false` if the view was torn down meanwhile, in
/// which case the result is dropped unapplied.
async fn run_fetch<T, F, Fut>(
    fetch: &F,
    state: &watch::Sender<ViewState<T>>,
    cancel: &CancellationToken,
) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    state.send_modify(|s| s.loading = true);

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => return false,
        result = fetch() => result,
    };

    if let Err(ref e) = result {
        warn!(error = %e, "poll failed; keeping previous data");
    }
    state.send_modify(|s| s.apply(result));
    true
}

async fn next_tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
