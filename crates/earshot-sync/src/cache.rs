//! [`CredentialCache`] binds a [`CredentialStore`] to the single key the
//! credential lives under.

use earshot_core::{
  credential::{Credential, Provenance},
  store::CredentialStore,
};

use crate::config::DEFAULT_CREDENTIAL_KEY;

pub struct CredentialCache<S> {
  store: S,
  key:   String,
}

impl<S: CredentialStore> CredentialCache<S> {
  pub fn new(store: S) -> Self { Self::with_key(store, DEFAULT_CREDENTIAL_KEY) }

  pub fn with_key(store: S, key: impl Into<String>) -> Self {
    Self { store, key: key.into() }
  }

  pub fn store(&self) -> &S { &self.store }

  /// The cached credential, if a non-empty one is stored.
  pub async fn load(&self) -> Result<Option<Credential>, S::Error> {
    let value = self.store.get(&self.key).await?;
    Ok(
      value
        .filter(|v| !v.is_empty())
        .map(|v| Credential::new(v, Provenance::Cached)),
    )
  }

  pub async fn save(&self, token: &str) -> Result<(), S::Error> {
    self.store.set(&self.key, token).await
  }

  /// Forget the credential so the next resolve goes through the fallback
  /// chain.
  pub async fn invalidate(&self) -> Result<(), S::Error> {
    self.store.remove(&self.key).await
  }
}
