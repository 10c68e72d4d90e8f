//! Stocksight core - session and authenticated-request layer of the
//! inventory/forecasting dashboard.
//!
//! The pieces, leaf first:
//! - [`auth::CredentialStore`] holds the bearer token and persists it
//! - [`api::ApiClient`] is the request gateway every API call goes through
//! - [`session::SessionController`] runs login, registration, demo login,
//!   logout and startup recovery
//! - [`session::SessionState`] / [`session::SessionContext`] publish the
//!   current identity to the rest of the application

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod session;

pub use api::{ApiClient, ApiError};
pub use auth::CredentialStore;
pub use config::Config;
pub use models::{Identity, RegisterData, Role};
pub use navigation::{Navigator, Route, RouteHistory};
pub use session::{SessionContext, SessionController, SessionError, SessionSnapshot, SessionState};
