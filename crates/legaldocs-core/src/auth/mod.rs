//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `SessionProvider`: owns the current session and serializes changes to it
//! - `CredentialStore`: where the session record survives restarts
//!   (memory, JSON file, or OS keychain)
//! - `Authenticator`: turns credentials into a session (demo rules or the
//!   remote API)

pub mod authenticator;
pub mod credentials;
pub mod error;
pub mod provider;
pub mod session;

pub use authenticator::{Authenticator, Credentials, DemoAuthenticator, Registration};
pub use credentials::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore,
};
pub use error::{AuthError, StoreError};
pub use provider::{AuthState, SessionProvider, SESSION_KEY};
pub use session::{local_part, Role, Session};
