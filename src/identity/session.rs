//! Session liveness store.
//!
//! A session id is live while its entry exists. Entries carry their own TTL; deleting
//! one revokes every credential that embeds that id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session not found")]
    NotFound,

    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value backing store for session ids. Implementations must support an
/// independent TTL per key and atomic per-key set/get/del.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError>;
    async fn get(&self, key: &str) -> Result<String, SessionStoreError>;
    /// Remove keys, returning how many existed. Missing keys are not an error.
    async fn del(&self, keys: &[String]) -> Result<usize, SessionStoreError>;
}

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process session store with lazy expiry on read and a periodic sweep.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    map: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.map.read().len() }

    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }

    /// Remove expired keys. Returns number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut w = self.map.write();
        let before = w.len();
        w.retain(|_, e| e.expires_at > now);
        before - w.len()
    }

    /// Spawn a background task sweeping expired sessions every `interval`.
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let removed = this.sweep();
                if removed > 0 { tracing::debug!(removed = removed, "session_sweep"); }
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError> {
        let expires_at = Instant::now() + ttl;
        self.map.write().insert(key.to_string(), Entry { value: value.to_string(), expires_at });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String, SessionStoreError> {
        {
            let r = self.map.read();
            match r.get(key) {
                Some(ent) if ent.expires_at > Instant::now() => return Ok(ent.value.clone()),
                Some(_) => {}
                None => return Err(SessionStoreError::NotFound),
            }
        }
        // Expired: prune it, unless it was re-set in between.
        let mut w = self.map.write();
        if let Some(ent) = w.get(key) {
            if ent.expires_at > Instant::now() { return Ok(ent.value.clone()); }
            w.remove(key);
        }
        Err(SessionStoreError::NotFound)
    }

    async fn del(&self, keys: &[String]) -> Result<usize, SessionStoreError> {
        let mut w = self.map.write();
        Ok(keys.iter().filter(|k| w.remove(k.as_str()).is_some()).count())
    }
}

/// Adapter the auth core talks to: typed session ids over any [`SessionStore`], with
/// each call bounded by `timeout`. A timeout surfaces as `Unavailable`, never as
/// `NotFound`.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn SessionStore>,
    timeout: Duration,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn SessionStore>, timeout: Duration) -> Self { Self { store, timeout } }

    pub async fn put(&self, session_id: Uuid, user_id: Uuid, ttl: Duration) -> Result<(), SessionStoreError> {
        let key = session_id.to_string();
        let value = user_id.to_string();
        self.bounded(self.store.set(&key, &value, ttl)).await
    }

    pub async fn get(&self, session_id: Uuid) -> Result<Uuid, SessionStoreError> {
        let raw = self.bounded(self.store.get(&session_id.to_string())).await?;
        Uuid::parse_str(&raw).map_err(|e| {
            tracing::warn!(sid = %session_id, "session entry holds a non-uuid value: {}", e);
            SessionStoreError::NotFound
        })
    }

    pub async fn delete(&self, session_ids: &[Uuid]) -> Result<usize, SessionStoreError> {
        if session_ids.is_empty() { return Ok(0); }
        let keys: Vec<String> = session_ids.iter().map(|s| s.to_string()).collect();
        self.bounded(self.store.del(&keys)).await
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, SessionStoreError>
    where
        F: std::future::Future<Output = Result<T, SessionStoreError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(SessionStoreError::Unavailable(format!("timed out after {}ms", self.timeout.as_millis()))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (MemorySessionStore, SessionRegistry) {
        let mem = MemorySessionStore::new();
        let reg = SessionRegistry::new(Arc::new(mem.clone()), Duration::from_secs(1));
        (mem, reg)
    }

    #[tokio::test]
    async fn put_get_delete() {
        let (_, reg) = registry();
        let sid = Uuid::new_v4();
        let uid = Uuid::new_v4();
        reg.put(sid, uid, Duration::from_secs(60)).await.unwrap();
        assert_eq!(reg.get(sid).await.unwrap(), uid);

        assert_eq!(reg.delete(&[sid]).await.unwrap(), 1);
        assert_eq!(reg.get(sid).await, Err(SessionStoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_, reg) = registry();
        let sid = Uuid::new_v4();
        reg.put(sid, Uuid::new_v4(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(reg.delete(&[sid]).await.unwrap(), 1);
        assert_eq!(reg.delete(&[sid]).await.unwrap(), 0);
        assert_eq!(reg.delete(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn expired_entries_read_as_not_found_and_are_pruned() {
        let (mem, reg) = registry();
        let sid = Uuid::new_v4();
        reg.put(sid, Uuid::new_v4(), Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(reg.get(sid).await, Err(SessionStoreError::NotFound));
        assert!(mem.is_empty());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let (mem, reg) = registry();
        reg.put(Uuid::new_v4(), Uuid::new_v4(), Duration::from_millis(10)).await.unwrap();
        let keep = Uuid::new_v4();
        reg.put(keep, Uuid::new_v4(), Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(mem.sweep(), 1);
        assert_eq!(mem.len(), 1);
        assert!(reg.get(keep).await.is_ok());
    }

    #[tokio::test]
    async fn stalled_backend_times_out_as_unavailable() {
        let reg = SessionRegistry::new(Arc::new(testing::StalledStore), Duration::from_millis(20));
        let err = reg.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, SessionStoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn concurrent_puts_are_all_visible() {
        let (mem, reg) = registry();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let reg = reg.clone();
            handles.push(tokio::spawn(async move {
                let sid = Uuid::new_v4();
                reg.put(sid, Uuid::new_v4(), Duration::from_secs(60)).await.unwrap();
                sid
            }));
        }
        for h in handles {
            let sid = h.await.unwrap();
            assert!(reg.get(sid).await.is_ok());
        }
        assert_eq!(mem.len(), 32);
    }
}
