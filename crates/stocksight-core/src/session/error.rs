use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum SessionError {
    /// A consumer asked for the session before the host provided one.
    #[error("session context not initialized")]
    ContextNotInitialized,

    #[error("session context already provided")]
    AlreadyProvided,

    #[error("Username and password required")]
    MissingCredentials,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    /// Whether the backend rejected the supplied username/password or role.
    pub fn is_rejected_credentials(&self) -> bool {
        matches!(self, SessionError::Api(ApiError::InvalidCredentials(_)))
    }
}
