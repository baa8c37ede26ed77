// ── Runtime console configuration ──
//
// Describes where the backend lives and how to reach it. Never touches
// disk; the CLI resolves profiles and hands a `ConsoleConfig` in.

use std::time::Duration;

use sybil_api::{TlsMode, TransportConfig};
use url::Url;

use crate::chat::DEFAULT_HISTORY_CAPACITY;
use crate::dispatcher::DEFAULT_SETTLE_DELAY;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend base URL, e.g. `http://localhost:8000`.
    pub url: Url,
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Delay before refreshing a view after a successful action.
    pub settle_delay: Duration,
    /// Chat messages kept per user.
    pub chat_history: usize,
}

impl ConsoleConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            settle_delay: DEFAULT_SETTLE_DELAY,
            chat_history: DEFAULT_HISTORY_CAPACITY,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig::default()
            .with_tls(self.tls.clone())
            .with_timeout(self.timeout)
    }
}
