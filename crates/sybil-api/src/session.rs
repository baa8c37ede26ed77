// ── Session store ──
//
// Holds the bearer token and the identity it belongs to. Every request
// reads it, any request may clear it. Reads are lock-free; clearing is
// a swap, so concurrent clears settle on exactly one winner.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::types::AdminUser;

/// Error type returned by persistence backends.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

// ── Session ─────────────────────────────────────────────────────────

/// An authenticated session: bearer token plus the user it was issued to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SecretString,
    pub user: AdminUser,
}

impl Session {
    pub fn new(token: impl Into<String>, user: AdminUser) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user,
        }
    }
}

/// Serializable form of a [`Session`], used by persistence backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user: AdminUser,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.expose_secret().to_owned(),
            user: session.user.clone(),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self::new(stored.token, stored.user)
    }
}

// ── Persistence ─────────────────────────────────────────────────────

/// Where a session survives between process runs.
///
/// `load` is called once, synchronously, when the store is built so the
/// console starts in its final authentication state.
pub trait SessionBackend: Send + Sync {
    fn load(&self) -> Result<Option<Session>, BackendError>;
    fn save(&self, session: &Session) -> Result<(), BackendError>;
    fn clear(&self) -> Result<(), BackendError>;
}

/// Process-local backend. Nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<StoredSession>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with an existing session.
    pub fn with_session(session: &Session) -> Self {
        Self {
            slot: Mutex::new(Some(StoredSession::from(session))),
        }
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Session>, BackendError> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.clone().map(Session::from))
    }

    fn save(&self, session: &Session) -> Result<(), BackendError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(StoredSession::from(session));
        Ok(())
    }

    fn clear(&self) -> Result<(), BackendError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// ── SessionStore ────────────────────────────────────────────────────

/// Shared, injectable session state.
///
/// Cheaply cloneable; every clone observes the same session. The
/// in-memory state is authoritative for the process: backend write
/// failures are logged, never surfaced to the caller.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    current: ArcSwapOption<Session>,
    backend: Box<dyn SessionBackend>,
    authenticated: watch::Sender<bool>,
}

impl SessionStore {
    /// Build a store over `backend`, loading any persisted session first.
    pub fn new(backend: impl SessionBackend + 'static) -> Self {
        let initial = match backend.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "failed to load persisted session; starting logged out");
                None
            }
        };
        if let Some(ref s) = initial {
            debug!(user = s.user.display_name(), "restored persisted session");
        }
        let (authenticated, _) = watch::channel(initial.is_some());

        Self {
            inner: Arc::new(StoreInner {
                current: ArcSwapOption::new(initial.map(Arc::new)),
                backend: Box::new(backend),
                authenticated,
            }),
        }
    }

    /// A store that forgets everything when the process exits.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Persist `token` and `user`; later requests carry the token.
    pub fn login(&self, token: impl Into<String>, user: AdminUser) {
        let session = Session::new(token, user);
        if let Err(e) = self.inner.backend.save(&session) {
            warn!(error = %e, "failed to persist session");
        }
        info!(user = session.user.display_name(), "logged in");
        self.inner.current.store(Some(Arc::new(session)));
        self.inner.authenticated.send_replace(true);
    }

    /// Clear the session. Returns `true` if a session was actually
    /// removed; clearing an empty store does nothing.
    pub fn logout(&self) -> bool {
        if self.inner.current.swap(None).is_none() {
            return false;
        }
        self.cleared();
        true
    }

    /// Clear the session only while `session` is still the current one.
    ///
    /// A rejection of a request sent with an older token must not end a
    /// session that was established after it was sent.
    pub fn expire(&self, session: &Arc<Session>) -> bool {
        let expected = Some(Arc::clone(session));
        let previous = self
            .inner
            .current
            .compare_and_swap(&expected, None::<Arc<Session>>);
        let won = matches!(&*previous, Some(prev) if Arc::ptr_eq(prev, session));
        if !won {
            debug!("ignoring rejection of a superseded session");
            return false;
        }
        self.cleared();
        true
    }

    fn cleared(&self) -> bool {
        if let Err(e) = self.inner.backend.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
        self.inner.authenticated.send_replace(false);
        info!("session cleared");
        true
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.current.load().is_some()
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Option<Arc<Session>> {
        self.inner.current.load_full()
    }

    pub fn token(&self) -> Option<SecretString> {
        self.inner.current.load().as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<AdminUser> {
        self.inner.current.load().as_ref().map(|s| s.user.clone())
    }

    /// Observe authentication state changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.authenticated.subscribe()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn user(name: &str) -> AdminUser {
        AdminUser {
            username: Some(name.into()),
            ..AdminUser::default()
        }
    }

    #[derive(Default)]
    struct CountingBackend {
        clears: Arc<AtomicUsize>,
    }

    impl SessionBackend for CountingBackend {
        fn load(&self) -> Result<Option<Session>, BackendError> {
            Ok(None)
        }
        fn save(&self, _: &Session) -> Result<(), BackendError> {
            Ok(())
        }
        fn clear(&self) -> Result<(), BackendError> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn login_then_logout() {
        let store = SessionStore::in_memory();
        assert!(!store.is_authenticated());

        store.login("tok-1", user("ops"));
        assert!(store.is_authenticated());
        assert_eq!(store.token().unwrap().expose_secret(), "tok-1");
        assert_eq!(store.user().unwrap().display_name(), "ops");

        assert!(store.logout());
        assert!(!store.is_authenticated());
        assert!(store.token().is_none());
    }

    #[test]
    fn logout_is_idempotent() {
        let clears = Arc::new(AtomicUsize::new(0));
        let store = SessionStore::new(CountingBackend {
            clears: Arc::clone(&clears),
        });
        store.login("tok", user("ops"));

        assert!(store.logout());
        assert!(!store.logout());
        assert!(!store.is_authenticated());
        assert_eq!(clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expire_spares_a_newer_session() {
        let clears = Arc::new(AtomicUsize::new(0));
        let store = SessionStore::new(CountingBackend {
            clears: Arc::clone(&clears),
        });
        store.login("old", user("ops"));
        let stale = store.current().unwrap();
        store.login("new", user("ops"));

        assert!(!store.expire(&stale));
        assert!(store.is_authenticated());
        assert_eq!(store.token().unwrap().expose_secret(), "new");
        assert_eq!(clears.load(Ordering::SeqCst), 0);

        let live = store.current().unwrap();
        assert!(store.expire(&live));
        assert!(!store.is_authenticated());
        assert!(!store.expire(&live));
        assert_eq!(clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn restores_from_backend_on_construction() {
        let seeded = Session::new("persisted", user("night-shift"));
        let store = SessionStore::new(MemoryBackend::with_session(&seeded));
        assert!(store.is_authenticated());
        assert_eq!(store.user().unwrap().display_name(), "night-shift");
        assert!(*store.subscribe().borrow());
    }

    #[test]
    fn clones_share_state() {
        let store = SessionStore::in_memory();
        let other = store.clone();
        store.login("tok", user("ops"));
        assert!(other.is_authenticated());
        other.logout();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn subscribers_see_transitions() {
        let store = SessionStore::in_memory();
        let mut rx = store.subscribe();
        assert!(!*rx.borrow_and_update());

        store.login("tok", user("ops"));
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        store.logout();
        assert!(!*rx.borrow_and_update());

        // A second logout does not notify.
        store.logout();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn debug_does_not_leak_token() {
        let store = SessionStore::in_memory();
        store.login("super-secret", user("ops"));
        let rendered = format!("{store:?} {:?}", store.current().unwrap());
        assert!(!rendered.contains("super-secret"));
    }
}
