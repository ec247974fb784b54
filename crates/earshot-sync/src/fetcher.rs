//! Presence fetcher: one authenticated poll of the buddy-list endpoint.

use std::sync::Arc;

use earshot_core::{
  credential::Credential,
  presence::RawPresenceEntry,
  store::CredentialStore,
};
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
  cache::CredentialCache,
  error::{CycleError, ExtractionError},
};

pub const BUDDYLIST_PATH: &str = "/presence-view/v1/buddylist";

pub struct PresenceFetcher<S> {
  client:        Client,
  presence_root: String,
  app_version:   String,
  cache:         Arc<CredentialCache<S>>,
}

impl<S: CredentialStore> PresenceFetcher<S> {
  pub fn new(
    client: Client,
    presence_root: impl Into<String>,
    app_version: impl Into<String>,
    cache: Arc<CredentialCache<S>>,
  ) -> Self {
    Self {
      client,
      presence_root: presence_root.into(),
      app_version: app_version.into(),
      cache,
    }
  }

  fn url(&self) -> String {
    format!("{}{BUDDYLIST_PATH}", self.presence_root.trim_end_matches('/'))
  }

  /// `GET {presence_root}/presence-view/v1/buddylist`
  ///
  /// A 401 also removes the cached credential so the next cycle re-enters
  /// the fallback chain instead of replaying it.
  pub async fn fetch(
    &self,
    credential: &Credential,
  ) -> Result<Vec<RawPresenceEntry>, CycleError> {
    let resp = self
      .client
      .get(self.url())
      .header(AUTHORIZATION, credential.authorization())
      .header("App-Platform", "WebPlayer")
      .header("Spotify-App-Version", &self.app_version)
      .send()
      .await
      .map_err(CycleError::Transport)?;

    let status = resp.status();
    if !status.is_success() {
      warn!(status = status.as_u16(), "presence request rejected");
      if status == StatusCode::UNAUTHORIZED {
        info!(credential = %credential.redacted(), "clearing rejected credential");
        if let Err(e) = self.cache.invalidate().await {
          warn!(error = %e, "could not clear rejected credential");
        }
        return Err(CycleError::Unauthorized);
      }
      return Err(CycleError::ServerError { status: status.as_u16() });
    }

    let body = resp.text().await.map_err(CycleError::Transport)?;
    parse_buddylist(&body)
  }
}

/// Parse a buddy-list response body.
///
/// A body without a `friends` array is an account with no friends, not an
/// error. Friend objects that cannot be decoded are dropped and logged.
pub fn parse_buddylist(body: &str) -> Result<Vec<RawPresenceEntry>, CycleError> {
  if body.is_empty() {
    return Err(CycleError::EmptyBody);
  }
  let envelope: Value = serde_json::from_str(body).map_err(CycleError::MalformedBody)?;

  let Some(friends) = envelope.get("friends").and_then(Value::as_array) else {
    debug!("response carries no friends list");
    return Ok(Vec::new());
  };

  let total = friends.len();
  let entries: Vec<_> = friends
    .iter()
    .cloned()
    .enumerate()
    .filter_map(|(index, value)| match RawPresenceEntry::decode(value) {
      Ok(entry) => Some(entry),
      Err(e) => {
        warn!(index, error = %ExtractionError::from(e), "dropping presence entry");
        None
      }
    })
    .collect();
  debug!(total, kept = entries.len(), "parsed buddy list");
  Ok(entries)
}
