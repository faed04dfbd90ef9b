use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keychain error: {0}")]
    Keyring(String),

    #[error("Keychain task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        StoreError::Keyring(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Credential store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Authentication request failed: {0}")]
    Api(#[from] ApiError),

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AuthError {
    /// Short message suitable for showing next to a login form.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidInput(msg) => msg.clone(),
            AuthError::Api(ApiError::Unauthorized) => "Invalid email or password".to_string(),
            AuthError::Api(ApiError::Conflict(_)) => {
                "An account with that email already exists".to_string()
            }
            AuthError::Api(ApiError::NetworkError(_)) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            AuthError::Api(ApiError::RateLimited) => {
                "Too many attempts. Please wait and try again.".to_string()
            }
            other => format!("Authentication failed: {}", other),
        }
    }
}
