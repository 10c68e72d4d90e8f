//! REST API client module for the Stocksight backend.
//!
//! This module provides the `ApiClient` request gateway for communicating
//! with the inventory/forecasting API: the `/auth` routes the session core
//! depends on, plus typed reads of dashboard, inventory, AI, KPI and health
//! data.
//!
//! The API uses JWT bearer token authentication obtained from `/auth/login`,
//! `/auth/register` or `/auth/demo/{role}`.

pub mod client;
pub mod error;
pub mod resources;

pub use client::{ApiClient, UnauthorizedHandler, REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
pub use resources::{Period, RankBy, ReorderPolicy, DEFAULT_WINDOW_DAYS};
