//! REST client for the LegalDocs backend.
//!
//! Only the authentication endpoints are wired up: `POST /login` and
//! `POST /register`, both returning a session-shaped JSON payload.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
