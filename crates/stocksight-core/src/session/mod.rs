//! Session management for the dashboard.
//!
//! This module provides:
//! - `SessionController`: login, registration, demo login, logout and
//!   startup recovery
//! - `SessionState`: the observable `{ identity, recovering }` pair
//! - `SessionContext`: provisioning scope that refuses reads before a
//!   controller has been provided
//!
//! The identity is never trusted from local state: it is fetched from
//! `/auth/me` after every credential change and dropped together with the
//! credential.

pub mod broadcast;
pub mod controller;
pub mod error;

pub use broadcast::{SessionContext, SessionSnapshot, SessionState};
pub use controller::SessionController;
pub use error::SessionError;
