//! Data-sync layer between `sybil-api` and the console front end.
//!
//! - **[`Poller`]** keeps one page's [`ViewState`] in sync with the backend:
//!   fetch on mount, on a fixed interval, and on demand. Failures keep the
//!   last good snapshot. Dropping the poller stops it and discards any
//!   in-flight result.
//!
//! - **[`ActionDispatcher`]** runs one mutation at a time per page and
//!   refreshes the page shortly after a success.
//!
//! - **[`Console`]** is the facade: login/logout against the shared
//!   [`SessionStore`](sybil_api::SessionStore), page constructors
//!   ([`views`]), chat sessions.
//!
//! - Page-specific rules live in [`pipeline`] (control gating, settings),
//!   [`transcripts`] (classification config, status filter), [`prompt`]
//!   (instruction preview) and [`chat`] (bounded transcript).

pub mod chat;
pub mod config;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod poller;
pub mod prompt;
pub mod transcripts;
pub mod views;

// ── Primary re-exports ──────────────────────────────────────────────
pub use chat::{ChatHistory, ChatSession};
pub use config::ConsoleConfig;
pub use console::Console;
pub use dispatcher::{ActionDispatcher, ActionOutcome, ActionState, Dispatch};
pub use error::CoreError;
pub use pipeline::{PipelineAction, PipelineSettings};
pub use poller::{PollHandle, Poller, ViewState};
pub use transcripts::{ClassificationSettings, StatusFilter};

// API types consumers need alongside the core.
pub use sybil_api::{
    AdminUser, MemoryBackend, Session, SessionBackend, SessionStore, StoredSession, TlsMode,
};
