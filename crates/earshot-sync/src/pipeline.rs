//! One pipeline cycle: resolve, fetch, enrich, build.

use std::{future::Future, sync::Arc};

use chrono::Utc;
use earshot_core::{
  host::HostBridge,
  store::CredentialStore,
  view::{PipelineResult, ViewRecord},
};
use reqwest::Client;
use tracing::{info, warn};

use crate::{
  builder::ViewBuilder,
  cache::CredentialCache,
  config::PipelineConfig,
  enrich::ContextEnricher,
  error::CycleError,
  extract::HostExtractor,
  fetcher::PresenceFetcher,
  resolver::CredentialResolver,
};

/// Anything the scheduler can run once per tick.
pub trait PollSource: Send + Sync + 'static {
  fn poll_once<'a>(
    &'a self,
  ) -> impl Future<Output = Result<Vec<ViewRecord>, CycleError>> + Send + 'a;
}

pub struct Pipeline<S, H> {
  resolver: CredentialResolver<S, H>,
  fetcher:  PresenceFetcher<S>,
  enricher: ContextEnricher,
  builder:  ViewBuilder,
}

impl<S, H> Pipeline<S, H>
where
  S: CredentialStore,
  H: HostBridge,
{
  /// Wire a pipeline from configuration. The resolver and the fetcher share
  /// one credential cache, so a 401 seen by the fetcher is visible to the
  /// next resolve.
  pub fn new(config: &PipelineConfig, store: S, bridge: H) -> reqwest::Result<Self> {
    let client = Client::builder().timeout(config.request_timeout).build()?;
    let cache = Arc::new(CredentialCache::with_key(store, config.credential_key.clone()));
    Ok(Self::from_parts(
      CredentialResolver::new(cache.clone(), HostExtractor::new(bridge, &config.host_origin)),
      PresenceFetcher::new(
        client.clone(),
        config.presence_root.clone(),
        config.app_version.clone(),
        cache,
      ),
      ContextEnricher::new(client, config.api_root.clone()),
      ViewBuilder::new(config.web_root.clone()),
    ))
  }

  pub fn from_parts(
    resolver: CredentialResolver<S, H>,
    fetcher: PresenceFetcher<S>,
    enricher: ContextEnricher,
    builder: ViewBuilder,
  ) -> Self {
    Self { resolver, fetcher, enricher, builder }
  }

  pub fn resolver(&self) -> &CredentialResolver<S, H> { &self.resolver }

  /// Run one cycle. Enrichment and per-entry failures are absorbed; only a
  /// credential or presence failure ends the cycle with an error.
  pub async fn run_cycle(&self) -> Result<Vec<ViewRecord>, CycleError> {
    let credential = self.resolver.resolve().await?;
    let entries = self.fetcher.fetch(&credential).await?;
    let enriched = self.enricher.enrich_all(&credential, &entries).await;
    let records = self.builder.build_all(&entries, &enriched, Utc::now());
    info!(
      friends = records.len(),
      online = records.iter().filter(|r| r.online).count(),
      "cycle complete"
    );
    Ok(records)
  }

  /// [`run_cycle`](Self::run_cycle) folded into a [`PipelineResult`].
  pub async fn poll(&self) -> PipelineResult {
    match self.run_cycle().await {
      Ok(records) => PipelineResult::ready(records),
      Err(e) => {
        warn!(kind = e.kind(), error = %e, "cycle failed");
        PipelineResult::failed(e.to_string())
      }
    }
  }
}

impl<S, H> PollSource for Pipeline<S, H>
where
  S: CredentialStore + 'static,
  H: HostBridge + 'static,
{
  async fn poll_once(&self) -> Result<Vec<ViewRecord>, CycleError> { self.run_cycle().await }
}
