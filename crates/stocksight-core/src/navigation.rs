//! Navigation side effects of the session core.
//!
//! The core never renders anything; it only tells the host which route to
//! show next. Hosts implement [`Navigator`] to perform the actual switch.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

/// Routes the session core can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Login entry point, target of logout and of every 401.
    Login,
    /// Authenticated landing page after a successful auth flow.
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Host hook for route changes.
///
/// Called synchronously from the session controller and the request gateway.
/// Implementations must tolerate being asked for the route they are already
/// on; a 401 during startup recovery redirects to login while the controller
/// may do the same moments later.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Number of navigations `RouteHistory` keeps.
const HISTORY_LIMIT: usize = 16;

/// Navigator that records where the session was sent.
///
/// Repeated requests for the current route are dropped, which makes redirects
/// idempotent. Only the most recent navigations are kept.
#[derive(Debug, Default)]
pub struct RouteHistory {
    visited: Mutex<VecDeque<Route>>,
}

impl RouteHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route most recently navigated to.
    pub fn current(&self) -> Option<Route> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .copied()
    }

    /// Recent distinct navigations, oldest first.
    pub fn visited(&self) -> Vec<Route> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }
}

impl Navigator for RouteHistory {
    fn navigate(&self, route: Route) {
        let mut visited = self.visited.lock().unwrap_or_else(PoisonError::into_inner);
        if visited.back() == Some(&route) {
            debug!(route = %route, "Already at route, ignoring redirect");
            return;
        }
        info!(route = %route, "Navigating");
        if visited.len() == HISTORY_LIMIT {
            visited.pop_front();
        }
        visited.push_back(route);
    }
}
