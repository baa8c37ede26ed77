// sybil-api: Async Rust client for the Sybil admin backend

pub mod client;
mod endpoints;
pub mod error;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{DEFAULT_BASE_URL, SybilClient};
pub use error::Error;
pub use session::{
    BackendError, MemoryBackend, Session, SessionBackend, SessionStore, StoredSession,
};
pub use transport::{TlsMode, TransportConfig};
pub use types::*;
