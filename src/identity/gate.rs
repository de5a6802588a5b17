//! Authorization gate: turns a raw access credential into a [`RequestContext`].
//!
//! Checks run in order and stop at the first failure: signature and validity
//! window, session liveness, then the user record. The same chain (with the
//! refresh key) backs the refresh flow.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::claims::SessionClaims;
use super::codec::CredentialKeys;
use super::errors::AuthError;
use super::request_context::RequestContext;
use super::session::SessionRegistry;
use crate::users::{User, UserStore, UserStoreError};

#[derive(Clone)]
pub struct AuthorizationGate {
    access_keys: Arc<CredentialKeys>,
    sessions: SessionRegistry,
    users: Arc<dyn UserStore>,
    lookup_timeout: Duration,
}

impl AuthorizationGate {
    pub fn new(
        access_keys: Arc<CredentialKeys>,
        sessions: SessionRegistry,
        users: Arc<dyn UserStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self { access_keys, sessions, users, lookup_timeout }
    }

    pub async fn authorize(&self, credential: Option<&str>) -> Result<RequestContext, AuthError> {
        let credential = credential.ok_or(AuthError::Unauthenticated)?;
        let (claims, user) =
            resolve_live_credential(&self.access_keys, &self.sessions, self.users.as_ref(), self.lookup_timeout, credential)
                .await?;
        Ok(RequestContext { user: user.view(), access_session_id: claims.token_uuid })
    }
}

/// Verify `credential` under `keys`, then require its session to be live and its
/// user to still exist. Read-only: nothing in either store is modified.
pub(crate) async fn resolve_live_credential(
    keys: &CredentialKeys,
    sessions: &SessionRegistry,
    users: &dyn UserStore,
    lookup_timeout: Duration,
    credential: &str,
) -> Result<(SessionClaims, User), AuthError> {
    let claims = keys.verify(credential)?;
    let owner = sessions.get(claims.token_uuid).await?;
    if owner != claims.sub {
        tracing::warn!(sid = %claims.token_uuid, sub = %claims.sub, owner = %owner, "session owner does not match credential subject");
        return Err(AuthError::SessionExpiredOrRevoked);
    }
    let user = load_user(users, owner, lookup_timeout).await?;
    Ok((claims, user))
}

async fn load_user(users: &dyn UserStore, id: Uuid, lookup_timeout: Duration) -> Result<User, AuthError> {
    match tokio::time::timeout(lookup_timeout, users.find_by_id(id)).await {
        Ok(Ok(user)) => Ok(user),
        Ok(Err(UserStoreError::NotFound)) => Err(AuthError::UserGone),
        Ok(Err(e)) => Err(AuthError::StoreUnavailable(e.to_string())),
        Err(_) => Err(AuthError::StoreUnavailable(format!("user lookup timed out after {}ms", lookup_timeout.as_millis()))),
    }
}
