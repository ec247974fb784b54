//! The `CredentialStore` trait and two storage-agnostic implementations.
//!
//! The trait is implemented by storage backends (e.g. `earshot-store-sqlite`).
//! The pipeline depends on this abstraction, never on a concrete backend, so
//! a synced store and a purely local one are interchangeable.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{Arc, Mutex, PoisonError},
};

use crate::{Error, Result};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A small persistent key-value space.
///
/// All methods return `Send` futures so the trait can be used from tasks on
/// a multi-threaded tokio runtime.
pub trait CredentialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read a value. `None` if the key was never set or has been removed.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Insert or overwrite a value.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove a value. Removing a missing key is not an error.
  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

impl<S: CredentialStore> CredentialStore for Arc<S> {
  type Error = S::Error;

  async fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
    (**self).get(key).await
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
    (**self).set(key, value).await
  }

  async fn remove(&self, key: &str) -> Result<(), Self::Error> {
    (**self).remove(key).await
  }
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

/// Process-local store. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
    // A panic while holding the lock cannot leave the map half-written.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CredentialStore for MemoryStore {
  type Error = Infallible;

  async fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
    Ok(self.map().get(key).cloned())
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), Infallible> {
    self.map().insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), Infallible> {
    self.map().remove(key);
    Ok(())
  }
}

// ─── MirroredStore ───────────────────────────────────────────────────────────

/// A synced primary store mirrored into a local backup.
///
/// Reads prefer the primary and fall back to the backup when the primary
/// misses or fails. Writes and removes go to both; a write succeeds if either
/// side accepted it.
#[derive(Debug, Clone)]
pub struct MirroredStore<P, L> {
  primary: P,
  local:   L,
}

impl<P, L> MirroredStore<P, L> {
  pub fn new(primary: P, local: L) -> Self { Self { primary, local } }

  pub fn primary(&self) -> &P { &self.primary }

  pub fn local(&self) -> &L { &self.local }
}

impl<P, L> CredentialStore for MirroredStore<P, L>
where
  P: CredentialStore,
  L: CredentialStore,
{
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<String>> {
    match self.primary.get(key).await {
      Ok(Some(v)) => return Ok(Some(v)),
      Ok(None) | Err(_) => {}
    }
    self
      .local
      .get(key)
      .await
      .map_err(|e| Error::Store(Box::new(e)))
  }

  async fn set(&self, key: &str, value: &str) -> Result<()> {
    let primary = self.primary.set(key, value).await;
    let local = self.local.set(key, value).await;
    match (primary, local) {
      (Err(e), Err(_)) => Err(Error::Store(Box::new(e))),
      _ => Ok(()),
    }
  }

  async fn remove(&self, key: &str) -> Result<()> {
    // Both sides must forget the value, otherwise a stale backup would be
    // read back on the next miss.
    let primary = self.primary.remove(key).await;
    let local = self.local.remove(key).await;
    primary.map_err(|e| Error::Store(Box::new(e)))?;
    local.map_err(|e| Error::Store(Box::new(e)))
  }
}

#[cfg(test)]
mod tests {
  use std::io;

  use super::*;

  /// A store whose every operation fails, standing in for an unavailable
  /// sync backend.
  struct Unavailable;

  impl CredentialStore for Unavailable {
    type Error = io::Error;

    async fn get(&self, _: &str) -> Result<Option<String>, io::Error> {
      Err(io::Error::other("offline"))
    }

    async fn set(&self, _: &str, _: &str) -> Result<(), io::Error> {
      Err(io::Error::other("offline"))
    }

    async fn remove(&self, _: &str) -> Result<(), io::Error> {
      Err(io::Error::other("offline"))
    }
  }

  #[tokio::test]
  async fn memory_store_round_trip() {
    let s = MemoryStore::new();
    assert_eq!(s.get("k").await.unwrap(), None);
    s.set("k", "v").await.unwrap();
    assert_eq!(s.get("k").await.unwrap().as_deref(), Some("v"));
    s.remove("k").await.unwrap();
    assert_eq!(s.get("k").await.unwrap(), None);
    // Removing again is fine.
    s.remove("k").await.unwrap();
  }

  #[tokio::test]
  async fn memory_store_clones_share_state() {
    let a = MemoryStore::new();
    let b = a.clone();
    a.set("k", "v").await.unwrap();
    assert_eq!(b.get("k").await.unwrap().as_deref(), Some("v"));
  }

  #[tokio::test]
  async fn mirrored_prefers_primary() {
    let m = MirroredStore::new(MemoryStore::new(), MemoryStore::new());
    m.primary().set("k", "sync").await.unwrap();
    m.local().set("k", "local").await.unwrap();
    assert_eq!(m.get("k").await.unwrap().as_deref(), Some("sync"));
  }

  #[tokio::test]
  async fn mirrored_falls_back_to_local_on_miss() {
    let m = MirroredStore::new(MemoryStore::new(), MemoryStore::new());
    m.local().set("k", "local").await.unwrap();
    assert_eq!(m.get("k").await.unwrap().as_deref(), Some("local"));
  }

  #[tokio::test]
  async fn mirrored_tolerates_unavailable_primary() {
    let m = MirroredStore::new(Unavailable, MemoryStore::new());
    m.set("k", "v").await.unwrap();
    assert_eq!(m.get("k").await.unwrap().as_deref(), Some("v"));
    assert!(m.remove("k").await.is_err());
    // The local side was still cleared.
    assert_eq!(m.local().get("k").await.unwrap(), None);
  }

  #[tokio::test]
  async fn mirrored_writes_and_removes_both_sides() {
    let m = MirroredStore::new(MemoryStore::new(), MemoryStore::new());
    m.set("k", "v").await.unwrap();
    assert_eq!(m.primary().get("k").await.unwrap().as_deref(), Some("v"));
    assert_eq!(m.local().get("k").await.unwrap().as_deref(), Some("v"));
    m.remove("k").await.unwrap();
    assert_eq!(m.get("k").await.unwrap(), None);
  }
}
