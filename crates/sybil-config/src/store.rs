// ── On-disk client state ──
//
// The persisted session and the per-user chat cache. Both are JSON files
// in the data directory, written via a temp file and rename. Files holding
// a token or a transcript are readable by the owner only.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sybil_api::{BackendError, ChatMessage, Session, SessionBackend, StoredSession};
use sybil_core::ChatHistory;
use tracing::debug;

use crate::ConfigError;

/// Write `contents` to `path` atomically with owner-only permissions.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// Persists the session as `session.json`.
#[derive(Debug, Clone)]
pub struct FileSessionBackend {
    path: PathBuf,
}

impl FileSessionBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backend at the platform default location.
    pub fn default_location() -> Self {
        Self::new(crate::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionBackend for FileSessionBackend {
    fn load(&self) -> Result<Option<Session>, BackendError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_str(&text)?;
        debug!(path = %self.path.display(), "loaded session");
        Ok(Some(stored.into()))
    }

    fn save(&self, session: &Session) -> Result<(), BackendError> {
        let json = serde_json::to_vec_pretty(&StoredSession::from(session))?;
        write_private(&self.path, &json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), BackendError> {
        remove_if_present(&self.path)?;
        Ok(())
    }
}

// ── Chat cache ──────────────────────────────────────────────────────

/// Per-user chat transcripts, one `chat-<user>.json` each.
///
/// Advisory only: a missing or corrupt file yields an empty history.
#[derive(Debug, Clone)]
pub struct ChatCache {
    dir: PathBuf,
}

/// On-disk chat cache. The owner is stored alongside the messages since
/// distinct user names can sanitize to the same file name.
#[derive(Deserialize, Serialize)]
struct CachedChat {
    user: String,
    messages: Vec<ChatMessage>,
}

impl ChatCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_location() -> Self {
        Self::new(crate::data_dir())
    }

    /// File for `user`; characters unsafe in file names become `_`.
    pub fn path_for(&self, user: &str) -> PathBuf {
        let safe: String = user
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '@') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("chat-{safe}.json"))
    }

    pub fn load(&self, user: &str, capacity: usize) -> ChatHistory {
        let path = self.path_for(user);
        let messages = fs::read_to_string(&path)
            .ok()
            .and_then(|text| match serde_json::from_str::<CachedChat>(&text) {
                Ok(cached) if cached.user == user => Some(cached.messages),
                Ok(cached) => {
                    debug!(
                        path = %path.display(),
                        owner = %cached.user,
                        "chat cache belongs to another user"
                    );
                    None
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "discarding corrupt chat cache");
                    None
                }
            })
            .unwrap_or_default();
        ChatHistory::from_messages(user, capacity, messages)
    }

    pub fn save(&self, history: &ChatHistory) -> Result<(), ConfigError> {
        let cached = CachedChat {
            user: history.user().to_owned(),
            messages: history.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&cached)?;
        write_private(&self.path_for(history.user()), &json)?;
        Ok(())
    }

    pub fn clear(&self, user: &str) -> Result<(), ConfigError> {
        remove_if_present(&self.path_for(user))?;
        Ok(())
    }
}
