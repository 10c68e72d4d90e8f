use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::CredentialStore;
use crate::config::Config;
use crate::models::{Identity, RegisterData, Role, TokenResponse};
use crate::navigation::{Navigator, Route};

use super::{SessionError, SessionSnapshot, SessionState};

/// Orchestrates the authentication flows and owns the current identity.
///
/// Operations take `&self` and may run concurrently. They are not serialized:
/// whichever flow settles last decides the final identity.
pub struct SessionController {
    api: ApiClient,
    state: SessionState,
    navigator: Arc<dyn Navigator>,
    recovery_started: AtomicBool,
}

impl SessionController {
    /// Wire a controller, its shared state and the request gateway around
    /// `credentials`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let state = SessionState::new(Arc::clone(&credentials));
        let api = ApiClient::new(base_url, timeout, credentials, Arc::clone(&navigator))?
            .on_unauthorized(Arc::new(state.clone()));

        Ok(Self {
            api,
            state,
            navigator,
            recovery_started: AtomicBool::new(false),
        })
    }

    pub fn from_config(
        config: &Config,
        credentials: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
            credentials,
            navigator,
        )
    }

    /// Gateway for any further authenticated calls.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.identity()
    }

    pub fn is_recovering(&self) -> bool {
        self.state.is_recovering()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub async fn wait_recovered(&self) -> SessionSnapshot {
        self.state.wait_recovered().await
    }

    /// Rebuild the session from the persisted credential.
    ///
    /// Runs once per controller; later calls return the current identity
    /// without touching the network. Failures are not surfaced: any error
    /// while fetching the identity leaves the session logged out.
    pub async fn recover(&self) -> Option<Identity> {
        if self.recovery_started.swap(true, Ordering::SeqCst) {
            debug!("Session recovery already ran");
            return self.identity();
        }

        if !self.api.credentials().is_present() {
            debug!("No stored credential, starting logged out");
            self.state.finish_recovery(None);
            return None;
        }

        match self.api.me().await {
            Ok(identity) => {
                info!(username = %identity.username, role = %identity.role, "Session recovered");
                self.state.finish_recovery(Some(identity));
            }
            Err(e) => {
                warn!(error = %e, "Stored credential could not be verified, starting logged out");
                self.state.clear();
                self.state.finish_recovery(None);
            }
        }
        self.identity()
    }

    /// Log in with a username and password.
    ///
    /// On failure nothing is committed; the error message is suitable for
    /// showing to the user.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, SessionError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }
        let token = self.api.login(username, password).await.map_err(|e| {
            debug!(error = %e, "Login rejected");
            e
        })?;
        self.establish(token).await
    }

    /// Create an account and log into it.
    pub async fn register(&self, data: &RegisterData) -> Result<Identity, SessionError> {
        let token = self.api.register(data).await.map_err(|e| {
            debug!(error = %e, "Registration rejected");
            e
        })?;
        self.establish(token).await
    }

    /// Log into the preset demo account for `role`.
    pub async fn demo_login(&self, role: Role) -> Result<Identity, SessionError> {
        let token = self.api.demo_login(role).await.map_err(|e| {
            debug!(role = %role, error = %e, "Demo login rejected");
            e
        })?;
        self.establish(token).await
    }

    /// End the session. Always succeeds locally, whatever the server says.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "Remote logout failed, clearing local session anyway");
        }
        self.state.clear();
        info!("Logged out");
        self.navigator.navigate(Route::Login);
    }

    /// Confirm the fresh token by fetching its identity, then commit both.
    async fn establish(&self, token: TokenResponse) -> Result<Identity, SessionError> {
        let identity = self.api.me_with_token(&token.access_token).await?;
        self.state.commit(token.access_token, identity.clone());
        self.navigator.navigate(Route::Dashboard);
        Ok(identity)
    }
}
