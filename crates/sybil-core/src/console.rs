// ── Console facade ──
//
// Ties configuration, the session store and the API client together and
// hands out page view-models and action dispatchers.

use std::sync::Arc;

use secrecy::SecretString;
use sybil_api::{
    AdminUser, GDriveStatus, PipelineConfigMap, PipelineRun, SessionStore, SybilClient,
    TranscriptQuery,
};
use tokio::sync::watch;

use crate::chat::{ChatHistory, ChatSession};
use crate::config::ConsoleConfig;
use crate::dispatcher::ActionDispatcher;
use crate::error::CoreError;
use crate::poller::{PollHandle, Poller};
use crate::views::{
    self, GDriveMonitor, PipelineDashboard, PipelineErrors, TranscriptsPage, WhitelistPage,
};

/// Entry point for UI consumers.
///
/// Cheaply cloneable; clones share the session store, so a 401 seen by
/// any view logs every clone out.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    client: SybilClient,
}

impl Console {
    /// Build the HTTP client around an existing session store.
    pub fn new(config: ConsoleConfig, session: SessionStore) -> Result<Self, CoreError> {
        let client = SybilClient::new(config.url.clone(), session, &config.transport())?;
        Ok(Self {
            inner: Arc::new(ConsoleInner { config, client }),
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &SybilClient {
        &self.inner.client
    }

    pub fn session(&self) -> &SessionStore {
        self.inner.client.session()
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Exchange credentials and store the resulting session.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AdminUser, CoreError> {
        let resp = self.client().login(username, password).await?;
        let user = resp.user.clone();
        self.session().login(resp.access_token, resp.user);
        Ok(user)
    }

    /// Forget the session. Returns `false` if there was none.
    pub fn logout(&self) -> bool {
        self.session().logout()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn user(&self) -> Option<AdminUser> {
        self.session().user()
    }

    /// Authentication state changes, e.g. to return to the login screen.
    pub fn auth_changes(&self) -> watch::Receiver<bool> {
        self.session().subscribe()
    }

    // ── Pages ────────────────────────────────────────────────────────

    pub fn pipeline_dashboard(&self) -> Poller<PipelineDashboard> {
        views::pipeline_dashboard(self.client())
    }

    pub fn pipeline_runs(&self) -> Poller<Vec<PipelineRun>> {
        views::pipeline_runs(self.client())
    }

    pub fn pipeline_errors(&self) -> Poller<PipelineErrors> {
        views::pipeline_errors(self.client())
    }

    pub fn pipeline_settings(&self) -> Poller<PipelineConfigMap> {
        views::pipeline_settings(self.client())
    }

    pub fn gdrive_monitor(&self, status: Option<GDriveStatus>) -> Poller<GDriveMonitor> {
        views::gdrive_monitor(self.client(), status)
    }

    pub fn otter_transcripts(&self, query: TranscriptQuery) -> Poller<TranscriptsPage> {
        views::otter_transcripts(self.client(), query)
    }

    pub fn whitelist(&self, include_inactive: bool) -> Poller<WhitelistPage> {
        views::whitelist(self.client(), include_inactive)
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Dispatcher for a page, refreshing `view` after each success.
    pub fn dispatcher(&self, view: PollHandle) -> ActionDispatcher {
        ActionDispatcher::with_refresh(self.inner.config.settle_delay, view)
    }

    /// Chat session for the logged-in user, continuing `history` if given.
    pub fn chat(&self, history: Option<ChatHistory>) -> Result<ChatSession, CoreError> {
        let user = self.user().ok_or(CoreError::NotAuthenticated)?;
        let history = history
            .filter(|h| h.user() == user.display_name())
            .unwrap_or_else(|| ChatHistory::new(user.display_name(), self.inner.config.chat_history));
        Ok(ChatSession::new(self.client().clone(), history))
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("url", &self.inner.config.url.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
