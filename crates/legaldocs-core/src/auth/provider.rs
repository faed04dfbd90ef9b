//! The session provider: single source of truth for who is signed in.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::{
    AuthError, Authenticator, CredentialStore, Credentials, Registration, Role, Session,
};

// ============================================================================
// Constants
// ============================================================================

/// Credential store key holding the serialized session
pub const SESSION_KEY: &str = "user";

/// Snapshot published to subscribers after every state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    /// True until the first `restore` finishes
    pub initializing: bool,
    pub session: Option<Session>,
}

impl AuthState {
    fn initial() -> Self {
        Self {
            initializing: true,
            session: None,
        }
    }
}

struct Inner {
    store: Arc<dyn CredentialStore>,
    authenticator: Arc<dyn Authenticator>,
    /// Held for the whole of every mutating operation
    write_lock: Mutex<()>,
    state: watch::Sender<AuthState>,
}

/// Owns the in-memory session and keeps the credential store mirroring it.
///
/// Lifecycle is `new` -> `restore` -> ready. Clones share state, so hand a
/// clone to every consumer instead of reaching for a global.
///
/// Mutations (`restore`, `login`, `register`, `logout`) are serialized: a
/// second call waits for the first to finish. The in-memory session is only
/// updated after the store write succeeds, so outside an in-flight operation
/// the stored record and the session always agree.
#[derive(Clone)]
pub struct SessionProvider {
    inner: Arc<Inner>,
}

impl SessionProvider {
    pub fn new(store: Arc<dyn CredentialStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        let (state, _) = watch::channel(AuthState::initial());
        Self {
            inner: Arc::new(Inner {
                store,
                authenticator,
                write_lock: Mutex::new(()),
                state,
            }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.state.borrow().session.clone()
    }

    pub fn is_initializing(&self) -> bool {
        self.inner.state.borrow().initializing
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().session.is_some()
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Load the persisted session, if any.
    ///
    /// Never fails: an unreadable store counts as logged out and a corrupt
    /// record is deleted. Always ends with `initializing == false`.
    pub async fn restore(&self) {
        let _guard = self.inner.write_lock.lock().await;

        let session = match self.inner.store.get(SESSION_KEY).await {
            Ok(None) => {
                debug!("No stored session");
                None
            }
            Ok(Some(record)) => match Session::from_record(&record) {
                Ok(session) => {
                    debug!(
                        email = %session.email_address,
                        role = %session.role,
                        "Session restored"
                    );
                    Some(session)
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable session record");
                    if let Err(e) = self.inner.store.delete(SESSION_KEY).await {
                        warn!(error = %e, "Failed to delete unreadable session record");
                    }
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to read credential store, starting signed out");
                None
            }
        };

        self.publish(session);
    }

    pub async fn login(&self, email_address: &str, password: &str) -> Result<Session, AuthError> {
        validate_credentials(email_address, password)?;
        let credentials = Credentials {
            email_address: email_address.to_string(),
            password: password.to_string(),
        };

        let _guard = self.inner.write_lock.lock().await;
        let session = self.inner.authenticator.login(&credentials).await?;
        self.persist(&session).await?;

        info!(email = %session.email_address, role = %session.role, "Login successful");
        self.publish(Some(session.clone()));
        Ok(session)
    }

    pub async fn register(
        &self,
        email_address: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Session, AuthError> {
        validate_credentials(email_address, password)?;
        let registration = Registration {
            email_address: email_address.to_string(),
            password: password.to_string(),
            display_name: display_name.map(str::to_string),
        };

        let _guard = self.inner.write_lock.lock().await;
        let mut session = self.inner.authenticator.register(&registration).await?;
        // Registration never grants admin, whatever the authenticator says
        if session.role != Role::StandardUser {
            warn!(
                email = %session.email_address,
                role = %session.role,
                "Downgrading role issued at registration"
            );
            session.role = Role::StandardUser;
        }
        self.persist(&session).await?;

        info!(email = %session.email_address, "Registration successful");
        self.publish(Some(session.clone()));
        Ok(session)
    }

    /// Sign out. Calling this while already signed out is a no-op.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _guard = self.inner.write_lock.lock().await;
        self.inner.store.delete(SESSION_KEY).await?;

        if self.is_authenticated() {
            info!("Logged out");
        }
        self.publish(None);
        Ok(())
    }

    async fn persist(&self, session: &Session) -> Result<(), AuthError> {
        let record = session.to_record()?;
        self.inner.store.set(SESSION_KEY, &record).await?;
        Ok(())
    }

    fn publish(&self, session: Option<Session>) {
        self.inner.state.send_replace(AuthState {
            initializing: false,
            session,
        });
    }
}

/// Reject missing credentials before anything is touched.
fn validate_credentials(email_address: &str, password: &str) -> Result<(), AuthError> {
    if email_address.trim().is_empty() || password.is_empty() {
        return Err(AuthError::InvalidInput(
            "Email and password required".to_string(),
        ));
    }
    Ok(())
}
