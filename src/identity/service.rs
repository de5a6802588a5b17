//! Login, refresh and logout over the issuers and the session registry.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::errors::AuthError;
use super::gate::resolve_live_credential;
use super::issuer::{CredentialIssuer, IssuedCredential};
use super::session::SessionRegistry;
use crate::users::{User, UserStore};

/// One credential kind: its issuer, the credential lifetime, and the cookie max-age.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: CredentialIssuer,
    pub ttl: Duration,
    pub max_age: Duration,
}

#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub access: IssuedCredential,
    pub refresh: IssuedCredential,
}

#[derive(Clone)]
pub struct SessionService {
    access: TokenSettings,
    refresh: TokenSettings,
    sessions: SessionRegistry,
    users: Arc<dyn UserStore>,
    lookup_timeout: Duration,
}

impl SessionService {
    pub fn new(
        access: TokenSettings,
        refresh: TokenSettings,
        sessions: SessionRegistry,
        users: Arc<dyn UserStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self { access, refresh, sessions, users, lookup_timeout }
    }

    pub fn access(&self) -> &TokenSettings { &self.access }

    pub fn refresh_settings(&self) -> &TokenSettings { &self.refresh }

    /// Issue an access and a refresh credential for an already authenticated user
    /// and register both session ids.
    pub async fn login(&self, user_id: Uuid) -> Result<LoginCredentials, AuthError> {
        let access = self.access.issuer.issue(user_id, self.access.ttl)?;
        let refresh = self.refresh.issuer.issue(user_id, self.refresh.ttl)?;

        self.sessions.put(access.session_id, user_id, access.ttl).await?;
        if let Err(e) = self.sessions.put(refresh.session_id, user_id, refresh.ttl).await {
            // Do not leave a half-registered login behind.
            if let Err(cleanup) = self.sessions.delete(&[access.session_id]).await {
                tracing::warn!(sid = %access.session_id, "could not roll back access session: {}", cleanup);
            }
            return Err(e.into());
        }
        tracing::info!(user = %user_id, access_sid = %access.session_id, refresh_sid = %refresh.session_id, "login");
        Ok(LoginCredentials { access, refresh })
    }

    /// Mint a new access credential from a live refresh credential. The refresh
    /// credential and its session are left as they are; on any failure nothing is
    /// written to the session store.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<(IssuedCredential, User), AuthError> {
        let raw = refresh_token.ok_or(AuthError::Unauthenticated)?;
        let (claims, user) = resolve_live_credential(
            self.refresh.issuer.keys(),
            &self.sessions,
            self.users.as_ref(),
            self.lookup_timeout,
            raw,
        )
        .await?;

        let access = self.access.issuer.issue(user.id, self.access.ttl)?;
        self.sessions.put(access.session_id, user.id, access.ttl).await?;
        tracing::info!(user = %user.id, refresh_sid = %claims.token_uuid, access_sid = %access.session_id, "refresh");
        Ok((access, user))
    }

    /// Revoke the access session and, if `refresh_token` verifies and belongs to
    /// `user_id`, its session as well. Ids that are already gone are not an error.
    pub async fn logout(
        &self,
        user_id: Uuid,
        access_session_id: Uuid,
        refresh_token: Option<&str>,
    ) -> Result<usize, AuthError> {
        let mut ids = vec![access_session_id];
        if let Some(raw) = refresh_token {
            match self.refresh.issuer.keys().verify(raw) {
                Ok(claims) if claims.sub == user_id => ids.push(claims.token_uuid),
                Ok(claims) => {
                    tracing::debug!(user = %user_id, sub = %claims.sub, "logout: ignoring refresh credential of another user")
                }
                Err(e) => tracing::debug!("logout: ignoring refresh credential: {}", e),
            }
        }
        let removed = self.sessions.delete(&ids).await?;
        tracing::info!(access_sid = %access_session_id, removed = removed, "logout");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::codec::test_keys;
    use crate::identity::session::testing::DownStore;
    use crate::identity::{AuthorizationGate, MemorySessionStore, SessionStoreError};
    use crate::users::{MemoryUserStore, NewUser};

    struct Fixture {
        service: SessionService,
        gate: AuthorizationGate,
        store: MemorySessionStore,
        sessions: SessionRegistry,
        users: MemoryUserStore,
    }

    fn settings(keys: Arc<crate::identity::CredentialKeys>, secs: u64) -> TokenSettings {
        TokenSettings { issuer: CredentialIssuer::new(keys), ttl: Duration::from_secs(secs), max_age: Duration::from_secs(secs) }
    }

    fn fixture() -> Fixture {
        let access_keys = Arc::new(test_keys::access());
        let store = MemorySessionStore::new();
        let sessions = SessionRegistry::new(Arc::new(store.clone()), Duration::from_secs(1));
        let users = MemoryUserStore::new();
        let service = SessionService::new(
            settings(access_keys.clone(), 900),
            settings(Arc::new(test_keys::refresh()), 3600),
            sessions.clone(),
            Arc::new(users.clone()),
            Duration::from_secs(1),
        );
        let gate = AuthorizationGate::new(access_keys, sessions.clone(), Arc::new(users.clone()), Duration::from_secs(1));
        Fixture { service, gate, store, sessions, users }
    }

    async fn user(f: &Fixture) -> User {
        f.users
            .create(NewUser { username: "alice".into(), email: "alice@example.com".into(), password_hash: "x".into() })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn login_registers_both_sessions() {
        let f = fixture();
        let u = user(&f).await;
        let creds = f.service.login(u.id).await.unwrap();
        assert_eq!(f.sessions.get(creds.access.session_id).await.unwrap(), u.id);
        assert_eq!(f.sessions.get(creds.refresh.session_id).await.unwrap(), u.id);
        assert_ne!(creds.access.session_id, creds.refresh.session_id);
        assert!(f.gate.authorize(Some(creds.access.token.as_str())).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_mints_a_new_access_credential() {
        let f = fixture();
        let u = user(&f).await;
        let creds = f.service.login(u.id).await.unwrap();
        let (access, who) = f.service.refresh(Some(creds.refresh.token.as_str())).await.unwrap();
        assert_eq!(who.id, u.id);
        assert_ne!(access.session_id, creds.access.session_id);
        assert!(f.gate.authorize(Some(access.token.as_str())).await.is_ok());
        // refresh session untouched
        assert!(f.sessions.get(creds.refresh.session_id).await.is_ok());
        assert_eq!(f.store.len(), 3);
    }

    #[tokio::test]
    async fn revoked_refresh_leaves_store_unchanged() {
        let f = fixture();
        let u = user(&f).await;
        let creds = f.service.login(u.id).await.unwrap();
        f.sessions.delete(&[creds.refresh.session_id]).await.unwrap();
        let before = f.store.len();

        let err = f.service.refresh(Some(creds.refresh.token.as_str())).await.unwrap_err();
        assert_eq!(err, AuthError::SessionExpiredOrRevoked);
        assert_eq!(f.store.len(), before);
    }

    #[tokio::test]
    async fn access_credential_cannot_refresh() {
        let f = fixture();
        let u = user(&f).await;
        let creds = f.service.login(u.id).await.unwrap();
        assert!(matches!(f.service.refresh(Some(creds.access.token.as_str())).await, Err(AuthError::Credential(_))));
        assert_eq!(f.service.refresh(None).await.unwrap_err(), AuthError::Unauthenticated);
    }

    #[tokio::test]
    async fn logout_revokes_both_and_repeats_cleanly() {
        let f = fixture();
        let u = user(&f).await;
        let creds = f.service.login(u.id).await.unwrap();

        let removed = f.service.logout(u.id, creds.access.session_id, Some(creds.refresh.token.as_str())).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(f.gate.authorize(Some(creds.access.token.as_str())).await.unwrap_err(), AuthError::SessionExpiredOrRevoked);
        assert_eq!(f.sessions.get(creds.refresh.session_id).await, Err(SessionStoreError::NotFound));

        let again = f.service.logout(u.id, creds.access.session_id, Some(creds.refresh.token.as_str())).await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn logout_ignores_unverifiable_refresh_cookie() {
        let f = fixture();
        let u = user(&f).await;
        let creds = f.service.login(u.id).await.unwrap();
        let removed = f.service.logout(u.id, creds.access.session_id, Some("garbage")).await.unwrap();
        assert_eq!(removed, 1);
        assert!(f.sessions.get(creds.refresh.session_id).await.is_ok());
    }

    #[tokio::test]
    async fn logout_leaves_another_users_refresh_session_alone() {
        let f = fixture();
        let alice = user(&f).await;
        let bob = f
            .users
            .create(NewUser { username: "bob".into(), email: "bob@example.com".into(), password_hash: "x".into() })
            .await
            .unwrap();
        let alice_creds = f.service.login(alice.id).await.unwrap();
        let bob_creds = f.service.login(bob.id).await.unwrap();

        let removed = f
            .service
            .logout(alice.id, alice_creds.access.session_id, Some(bob_creds.refresh.token.as_str()))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(f.sessions.get(bob_creds.refresh.session_id).await.unwrap(), bob.id);
        assert!(f.service.refresh(Some(bob_creds.refresh.token.as_str())).await.is_ok());
    }

    #[tokio::test]
    async fn login_against_dead_store_is_unavailable() {
        let users = MemoryUserStore::new();
        let service = SessionService::new(
            settings(Arc::new(test_keys::access()), 60),
            settings(Arc::new(test_keys::refresh()), 60),
            SessionRegistry::new(Arc::new(DownStore), Duration::from_secs(1)),
            Arc::new(users),
            Duration::from_secs(1),
        );
        assert!(matches!(service.login(Uuid::new_v4()).await, Err(AuthError::StoreUnavailable(_))));
    }
}
