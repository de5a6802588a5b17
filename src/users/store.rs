use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use super::model::{NewUser, User, UserPatch};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserStoreError {
    #[error("user not found")]
    NotFound,

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Relational user record store. The auth core only calls the `find_*` methods.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<User, UserStoreError>;
    async fn find_by_username(&self, username: &str) -> Result<User, UserStoreError>;
    async fn find_by_email(&self, email: &str) -> Result<User, UserStoreError>;
    async fn create(&self, new: NewUser) -> Result<User, UserStoreError>;
    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, UserStoreError>;
    async fn delete(&self, id: Uuid) -> Result<User, UserStoreError>;
}

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.users.read().len() }

    pub fn is_empty(&self) -> bool { self.users.read().is_empty() }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<User, UserStoreError> {
        self.users.read().get(&id).cloned().ok_or(UserStoreError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, UserStoreError> {
        self.users.read().values().find(|u| u.username == username).cloned().ok_or(UserStoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, UserStoreError> {
        self.users
            .read()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or(UserStoreError::NotFound)
    }

    async fn create(&self, new: NewUser) -> Result<User, UserStoreError> {
        let mut w = self.users.write();
        if w.values().any(|u| u.username == new.username) {
            return Err(UserStoreError::UsernameTaken(new.username));
        }
        let user = User { id: Uuid::new_v4(), username: new.username, email: new.email, password_hash: new.password_hash };
        w.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User, UserStoreError> {
        let mut w = self.users.write();
        if let Some(name) = patch.username.as_deref() {
            if w.values().any(|u| u.id != id && u.username == name) {
                return Err(UserStoreError::UsernameTaken(name.to_string()));
            }
        }
        let user = w.get_mut(&id).ok_or(UserStoreError::NotFound)?;
        if let Some(username) = patch.username { user.username = username; }
        if let Some(email) = patch.email { user.email = email; }
        if let Some(hash) = patch.password_hash { user.password_hash = hash; }
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<User, UserStoreError> {
        self.users.write().remove(&id).ok_or(UserStoreError::NotFound)
    }
}
