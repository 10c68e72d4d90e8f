//! Data models for the session core.
//!
//! These types mirror the JSON exchanged with the Stocksight API's `/auth`
//! routes. Field names follow the backend's snake_case wire format.

pub mod user;

pub use user::{Identity, RegisterData, Role, TokenResponse};
