//! Shared session state and its subscription surface.

use std::sync::{Arc, OnceLock};

use tokio::sync::watch;
use tracing::{error, info};

use crate::api::UnauthorizedHandler;
use crate::auth::CredentialStore;
use crate::models::Identity;

use super::{SessionController, SessionError};

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    /// True only while startup recovery is running. Identity-dependent views
    /// must wait for this to clear.
    pub recovering: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            identity: None,
            recovering: true,
        }
    }
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Observable session state.
///
/// Identity changes that involve the credential (commit, clear) happen inside
/// one `send_modify`, so a subscriber never sees an identity without a stored
/// credential. Clone is cheap and every clone observes the same state.
#[derive(Clone)]
pub struct SessionState {
    credentials: Arc<CredentialStore>,
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionState {
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self {
            credentials,
            tx: Arc::new(tx),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.tx.borrow().identity.clone()
    }

    pub fn is_recovering(&self) -> bool {
        self.tx.borrow().recovering
    }

    /// Receive every subsequent change. The receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Wait until startup recovery has finished and return the state it left.
    pub async fn wait_recovered(&self) -> SessionSnapshot {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel
        let snapshot = match rx.wait_for(|s| !s.recovering).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    /// Store `token` and `identity` together.
    pub(crate) fn commit(&self, token: String, identity: Identity) {
        info!(username = %identity.username, role = %identity.role, "Session established");
        self.tx.send_modify(|s| {
            self.credentials.set(Some(token));
            s.identity = Some(identity);
        });
    }

    /// End startup recovery. An identity is only adopted while a credential
    /// is still stored; a concurrent 401 may have removed it.
    pub(crate) fn finish_recovery(&self, identity: Option<Identity>) {
        self.tx.send_modify(|s| {
            if let Some(identity) = identity {
                if self.credentials.is_present() {
                    s.identity = Some(identity);
                }
            }
            s.recovering = false;
        });
    }

    /// Forget the credential and the identity together.
    pub(crate) fn clear(&self) {
        self.tx.send_modify(|s| {
            self.credentials.clear();
            s.identity = None;
        });
    }
}

impl UnauthorizedHandler for SessionState {
    fn on_unauthorized(&self) {
        info!("Session expired, clearing identity");
        self.clear();
    }
}

/// Provisioning scope for the session.
///
/// The host provides the controller once at startup; every consumer reads it
/// back through this context. Reads before provisioning fail with
/// [`SessionError::ContextNotInitialized`] instead of yielding a default
/// logged-out session.
#[derive(Default)]
pub struct SessionContext {
    session: OnceLock<Arc<SessionController>>,
}

impl SessionContext {
    pub const fn new() -> Self {
        Self {
            session: OnceLock::new(),
        }
    }

    /// Make `controller` the session for this context. Only the first call wins.
    pub fn provide(&self, controller: Arc<SessionController>) -> Result<(), SessionError> {
        self.session
            .set(controller)
            .map_err(|_| SessionError::AlreadyProvided)
    }

    pub fn is_provided(&self) -> bool {
        self.session.get().is_some()
    }

    /// The provided session controller, exposing identity, recovery state and
    /// the login, register, demo login and logout operations.
    pub fn session(&self) -> Result<&Arc<SessionController>, SessionError> {
        self.session.get().ok_or_else(|| {
            error!("Session read outside of a provided session context");
            SessionError::ContextNotInitialized
        })
    }

    pub fn identity(&self) -> Result<Option<Identity>, SessionError> {
        Ok(self.session()?.identity())
    }

    pub fn is_recovering(&self) -> Result<bool, SessionError> {
        Ok(self.session()?.is_recovering())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn identity(role: Role) -> Identity {
        Identity {
            id: None,
            username: format!("{}@erp.com", role),
            email: format!("{}@erp.com", role),
            full_name: "Test User".to_string(),
            role,
        }
    }

    #[test]
    fn test_initial_snapshot_is_recovering() {
        let state = SessionState::new(Arc::new(CredentialStore::in_memory()));
        let snapshot = state.snapshot();
        assert!(snapshot.recovering);
        assert!(!snapshot.is_authenticated());
    }

    #[test]
    fn test_commit_and_clear_move_credential_with_identity() {
        let credentials = Arc::new(CredentialStore::in_memory());
        let state = SessionState::new(Arc::clone(&credentials));

        state.commit("tok".to_string(), identity(Role::Manager));
        assert_eq!(credentials.get().as_deref(), Some("tok"));
        assert_eq!(state.identity().unwrap().role, Role::Manager);

        state.clear();
        assert_eq!(credentials.get(), None);
        assert_eq!(state.identity(), None);
    }

    #[test]
    fn test_recovery_ignores_identity_once_credential_is_gone() {
        let credentials = Arc::new(CredentialStore::in_memory());
        let state = SessionState::new(credentials);

        state.finish_recovery(Some(identity(Role::Admin)));
        let snapshot = state.snapshot();
        assert!(!snapshot.recovering);
        assert_eq!(snapshot.identity, None);
    }

    #[test]
    fn test_unauthorized_handler_clears_state() {
        let credentials = Arc::new(CredentialStore::in_memory());
        let state = SessionState::new(Arc::clone(&credentials));
        state.commit("tok".to_string(), identity(Role::Viewer));

        state.on_unauthorized();
        assert!(!credentials.is_present());
        assert!(!state.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let state = SessionState::new(Arc::new(CredentialStore::in_memory()));
        let mut rx = state.subscribe();

        state.commit("tok".to_string(), identity(Role::Admin));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().identity.as_ref().unwrap().role, Role::Admin);

        state.finish_recovery(None);
        let snapshot = state.wait_recovered().await;
        assert!(!snapshot.recovering);
    }

    #[test]
    fn test_unprovided_context_fails_fast() {
        let context = SessionContext::new();
        assert!(!context.is_provided());
        assert!(matches!(context.session(), Err(SessionError::ContextNotInitialized)));
        assert!(matches!(context.identity(), Err(SessionError::ContextNotInitialized)));
        assert!(matches!(context.is_recovering(), Err(SessionError::ContextNotInitialized)));
    }
}
