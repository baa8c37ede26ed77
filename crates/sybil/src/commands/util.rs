//! Shared helpers for command handlers.

use std::future::Future;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use chrono::Local;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;

use sybil_core::{ActionDispatcher, CoreError, Dispatch, Poller, ViewState};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Palette};

// ── Prompts ──────────────────────────────────────────────────────────

/// Map a dialoguer / terminal I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Ask before a destructive action; `--yes` approves without asking.
pub fn confirm(message: &str, global: &GlobalOpts, action: &str) -> Result<bool, CliError> {
    if global.yes {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

// ── Progress ─────────────────────────────────────────────────────────

/// Await `fut` behind a spinner on stderr. No spinner with `--quiet`
/// or when stderr is not a terminal.
pub async fn with_spinner<F: Future>(global: &GlobalOpts, message: &str, fut: F) -> F::Output {
    if global.quiet || !std::io::stderr().is_terminal() {
        return fut.await;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    bar.finish_and_clear();
    out
}

/// Run a mutation through `dispatcher` and report its outcome.
pub async fn run_action<F, Fut>(
    dispatcher: &ActionDispatcher,
    name: &str,
    global: &GlobalOpts,
    op: F,
) -> Result<String, CliError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, CoreError>>,
{
    let palette = Palette::new(global);
    match with_spinner(global, &format!("{name}…"), dispatcher.dispatch(name, op)).await {
        Dispatch::Succeeded(message) => {
            output::notice(global, &palette.success(&format!("✓ {message}")));
            Ok(message)
        }
        Dispatch::Failed(err) => Err(err.into()),
        Dispatch::Busy => Err(CliError::Internal(format!(
            "another action is still running; '{name}' was not sent"
        ))),
    }
}

// ── Views ────────────────────────────────────────────────────────────

/// Error for a view whose last fetch failed.
pub fn view_error<T>(state: &ViewState<T>) -> Option<CliError> {
    state.error.clone().map(CliError::from)
}

/// Wait for a view's first snapshot.
pub async fn first_snapshot<T>(view: &Poller<T>) -> Result<std::sync::Arc<T>, CliError>
where
    T: Send + Sync + 'static,
{
    let state = view
        .settled()
        .await
        .ok_or_else(|| CliError::Internal("view closed before loading".into()))?;
    if let Some(err) = view_error(&state) {
        return Err(err);
    }
    state
        .data
        .ok_or_else(|| CliError::Internal("view settled without data".into()))
}

/// Print every fresh snapshot of `view` until Ctrl-C.
///
/// A failed refresh is reported and the loop keeps going; an expired
/// session ends it.
pub async fn watch<T>(
    view: &Poller<T>,
    global: &GlobalOpts,
    render: impl Fn(&T) -> Result<String, CliError>,
) -> Result<(), CliError>
where
    T: Send + Sync + 'static,
{
    let palette = Palette::new(global);
    let mut updates = view.stream();
    let mut seen = 0;

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        let state = tokio::select! {
            _ = &mut interrupted => return Ok(()),
            next = updates.next() => match next {
                Some(state) => state,
                None => return Ok(()),
            },
        };
        // Loading-flag flips carry no new result.
        if state.generation == seen {
            continue;
        }
        seen = state.generation;

        let stamp = state.last_updated.map_or_else(
            || "never".to_owned(),
            |t| t.with_timezone(&Local).format("%H:%M:%S").to_string(),
        );
        match (view_error(&state), state.data.as_deref()) {
            (Some(err @ (CliError::SessionExpired | CliError::NotLoggedIn)), _) => return Err(err),
            (Some(err), _) => output::notice(
                global,
                &palette.warning(&format!("refresh failed: {err} (last good data from {stamp})")),
            ),
            (None, Some(data)) => {
                output::print_output(&render(data)?, global.quiet);
                output::notice(global, &palette.dim(&format!("updated {stamp}, Ctrl-C to stop")));
            }
            (None, None) => {}
        }
    }
}
