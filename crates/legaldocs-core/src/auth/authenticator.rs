use async_trait::async_trait;
use rand::Rng;

use super::{AuthError, Role, Session};

/// Identity prefixes keep login- and registration-issued ids from colliding
const LOGIN_ID_PREFIX: &str = "usr";
const REGISTER_ID_PREFIX: &str = "reg";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email_address: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub email_address: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Turns credentials into a session. Whatever implements this is the trust
/// boundary: the role on the returned session is taken as given.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    async fn register(&self, registration: &Registration) -> Result<Session, AuthError>;
}

/// Offline stand-in for the remote backend.
///
/// Accepts any password. Login derives the role from the email address;
/// registration always yields a standard user. Not fit for anything that
/// claims real authentication.
#[derive(Debug, Default, Clone)]
pub struct DemoAuthenticator;

impl DemoAuthenticator {
    pub fn new() -> Self {
        Self
    }

    fn issue_id(prefix: &str) -> String {
        let n: u64 = rand::thread_rng().gen();
        format!("{}_{:016x}", prefix, n)
    }
}

#[async_trait]
impl Authenticator for DemoAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        Ok(Session::new(
            Self::issue_id(LOGIN_ID_PREFIX),
            credentials.email_address.clone(),
            Role::from_email(&credentials.email_address),
            None,
        ))
    }

    async fn register(&self, registration: &Registration) -> Result<Session, AuthError> {
        Ok(Session::new(
            Self::issue_id(REGISTER_ID_PREFIX),
            registration.email_address.clone(),
            Role::StandardUser,
            registration.display_name.as_deref(),
        ))
    }
}
