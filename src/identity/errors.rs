use thiserror::Error;

use super::codec::CodecError;
use super::issuer::IssueError;
use super::session::SessionStoreError;

/// Why a request was not authorized (or a credential could not be minted).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential presented")]
    Unauthenticated,

    #[error(transparent)]
    Credential(#[from] CodecError),

    #[error("session expired or revoked")]
    SessionExpiredOrRevoked,

    #[error("user belonging to this credential no longer exists")]
    UserGone,

    #[error("backing store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("could not issue credential: {0}")]
    Issue(#[from] IssueError),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Credential(_) => "invalid_credential",
            AuthError::SessionExpiredOrRevoked => "session_revoked",
            AuthError::UserGone => "user_gone",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::Issue(_) => "issue_failed",
        }
    }

    /// Message shown to clients. Codec failures collapse into one message so the
    /// response does not reveal which validation step failed.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "You are not logged in",
            AuthError::Credential(_) => "Token is invalid or has expired",
            AuthError::SessionExpiredOrRevoked => "Token is invalid or session has expired",
            AuthError::UserGone => "The user belonging to this token no longer exists",
            AuthError::StoreUnavailable(_) => "Session store is unavailable, try again later",
            AuthError::Issue(_) => "Could not issue token",
        }
    }
}

impl From<SessionStoreError> for AuthError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound => AuthError::SessionExpiredOrRevoked,
            SessionStoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
        }
    }
}
