//! Credential resolution as an ordered fallback chain.
//!
//! Each [`CredentialSource`] is probed in turn; the first one that yields a
//! credential wins. When every source misses, the error of the last miss is
//! returned, so with the default order `[Store, HostPage]` a caller sees
//! either [`CycleError::NoHostPage`] or [`CycleError::NoCredential`].

use std::sync::Arc;

use earshot_core::{
  credential::{Credential, Provenance},
  host::HostBridge,
  store::CredentialStore,
};
use tracing::{debug, info, warn};

use crate::{cache::CredentialCache, error::CycleError, extract::HostExtractor};

/// A place a credential can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
  /// The credential store.
  Store,
  /// The first open host page, via the extraction fallback. A hit is written
  /// back to the store.
  HostPage,
}

pub const DEFAULT_SOURCES: [CredentialSource; 2] =
  [CredentialSource::Store, CredentialSource::HostPage];

/// Outcome of probing a single source.
#[derive(Debug)]
pub enum Probe {
  Found(Credential),
  Missed(CycleError),
}

pub struct CredentialResolver<S, H> {
  cache:   Arc<CredentialCache<S>>,
  host:    HostExtractor<H>,
  sources: Vec<CredentialSource>,
}

impl<S, H> CredentialResolver<S, H>
where
  S: CredentialStore,
  H: HostBridge,
{
  pub fn new(cache: Arc<CredentialCache<S>>, host: HostExtractor<H>) -> Self {
    Self { cache, host, sources: DEFAULT_SOURCES.to_vec() }
  }

  pub fn with_sources(mut self, sources: Vec<CredentialSource>) -> Self {
    self.sources = sources;
    self
  }

  pub fn cache(&self) -> &Arc<CredentialCache<S>> { &self.cache }

  pub fn host(&self) -> &HostExtractor<H> { &self.host }

  /// Walk the chain once. No retries; the next cycle is the retry.
  pub async fn resolve(&self) -> Result<Credential, CycleError> {
    let mut last_miss = CycleError::NoCredential;
    for &source in &self.sources {
      match self.probe(source).await {
        Probe::Found(credential) => {
          debug!(?source, credential = %credential.redacted(), "resolved credential");
          return Ok(credential);
        }
        Probe::Missed(err) => {
          debug!(?source, reason = err.kind(), "credential source missed");
          last_miss = err;
        }
      }
    }
    Err(last_miss)
  }

  pub async fn probe(&self, source: CredentialSource) -> Probe {
    match source {
      CredentialSource::Store => self.probe_store().await,
      CredentialSource::HostPage => self.probe_host().await,
    }
  }

  async fn probe_store(&self) -> Probe {
    match self.cache.load().await {
      Ok(Some(credential)) => Probe::Found(credential),
      Ok(None) => Probe::Missed(CycleError::NoCredential),
      Err(e) => {
        warn!(error = %e, "credential store read failed; treating as empty");
        Probe::Missed(CycleError::NoCredential)
      }
    }
  }

  async fn probe_host(&self) -> Probe {
    let Some(page) = self.host.first_page().await else {
      return Probe::Missed(CycleError::NoHostPage);
    };

    let Some(token) = self.host.extract_from_host(&page).await else {
      info!(page = %page.id, "host page holds no credential");
      return Probe::Missed(CycleError::NoCredential);
    };

    // Persisting is best effort; the credential is good for this cycle
    // either way.
    if let Err(e) = self.cache.save(&token).await {
      warn!(error = %e, "could not cache extracted credential");
    }
    info!(page = %page.id, "extracted credential from host page");
    Probe::Found(Credential::new(token, Provenance::Extracted))
  }
}
