//! Core library for LegalDocs, the legal document assistant.
//!
//! - `auth`: session provider, credential stores, authenticators
//! - `nav`: role-based menus, landing pages and the route guard
//! - `api`: client for the backend's authentication endpoints
//! - `config`: on-disk configuration and provider wiring

pub mod api;
pub mod auth;
pub mod config;
pub mod nav;

pub use auth::{AuthError, AuthState, Role, Session, SessionProvider};
pub use config::Config;
pub use nav::{Access, NavItem, NavView, RouteGuard};
