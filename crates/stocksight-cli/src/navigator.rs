use stocksight_core::{Navigator, Route, RouteHistory};

/// Reports route changes on the terminal.
///
/// Redirects to the route the shell is already on are not repeated.
pub struct TerminalNavigator {
    history: RouteHistory,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self {
            history: RouteHistory::new(),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        if self.history.current() == Some(route) {
            return;
        }
        self.history.navigate(route);
        match route {
            Route::Login => eprintln!("→ {} (please log in)", route),
            Route::Dashboard => eprintln!("→ {}", route),
        }
    }
}
