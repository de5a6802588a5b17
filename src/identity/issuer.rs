use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::claims::SessionClaims;
use super::codec::{CodecError, CredentialKeys};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("validity duration must be positive")]
    InvalidDuration,

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A freshly signed credential. Registering `session_id` in the session store is
/// the caller's job.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub ttl: Duration,
}

/// Mints credentials of one kind under one private key.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    keys: Arc<CredentialKeys>,
}

impl CredentialIssuer {
    pub fn new(keys: Arc<CredentialKeys>) -> Self { Self { keys } }

    pub fn keys(&self) -> &CredentialKeys { &self.keys }

    pub fn issue(&self, user_id: Uuid, validity: Duration) -> Result<IssuedCredential, IssueError> {
        if validity.is_zero() {
            return Err(IssueError::InvalidDuration);
        }
        let ttl = chrono::Duration::from_std(validity).map_err(|_| IssueError::InvalidDuration)?;
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or(IssueError::InvalidDuration)?;
        let session_id = Uuid::new_v4();

        let claims = SessionClaims::new(user_id, session_id, now, expires_at);
        let token = self.keys.sign(&claims)?;
        tracing::debug!(user = %user_id, sid = %session_id, ttl_secs = validity.as_secs(), "credential.issue");

        Ok(IssuedCredential { token, session_id, expires_at, ttl: validity })
    }
}
