//! Context enrichment: resolve a context URI to a display name and URL.
//!
//! Lookups never fail the batch. Anything short of a well-formed success
//! response becomes `None`, and the view builder falls back to what the
//! presence entry itself carried.

use earshot_core::{
  credential::Credential,
  presence::{EnrichedContext, RawPresenceEntry},
  uri::ContextRef,
};
use futures::future::join_all;
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, warn};

// ─── Wire shape ──────────────────────────────────────────────────────────────

/// The subset of an album/playlist/artist object we read.
#[derive(Debug, Deserialize)]
struct ContextMetadata {
  name:          Option<String>,
  #[serde(default)]
  images:        Option<Vec<Image>>,
  #[serde(default)]
  external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct Image {
  url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
  spotify: Option<String>,
}

impl From<ContextMetadata> for EnrichedContext {
  fn from(m: ContextMetadata) -> Self {
    Self {
      name:      m.name,
      url:       m.external_urls.and_then(|u| u.spotify),
      image_url: m
        .images
        .and_then(|imgs| imgs.into_iter().next())
        .and_then(|img| img.url),
    }
  }
}

// ─── Enricher ────────────────────────────────────────────────────────────────

pub struct ContextEnricher {
  client:   Client,
  api_root: String,
}

impl ContextEnricher {
  pub fn new(client: Client, api_root: impl Into<String>) -> Self {
    Self { client, api_root: api_root.into() }
  }

  /// Look up the context behind `context_uri`.
  ///
  /// `None` for an absent, malformed, or unsupported URI without any
  /// request, and for any failed lookup.
  pub async fn enrich(
    &self,
    credential: &Credential,
    context_uri: Option<&str>,
  ) -> Option<EnrichedContext> {
    let uri = context_uri.filter(|u| !u.is_empty())?;
    let context: ContextRef = match uri.parse() {
      Ok(c) => c,
      Err(e) => {
        debug!(uri, reason = %e, "context not enrichable");
        return None;
      }
    };

    let url = format!(
      "{}/v1/{}/{}",
      self.api_root.trim_end_matches('/'),
      context.kind.collection(),
      context.id
    );
    let resp = match self
      .client
      .get(&url)
      .header(AUTHORIZATION, credential.authorization())
      .send()
      .await
    {
      Ok(r) => r,
      Err(e) => {
        warn!(uri, error = %e, "context lookup failed");
        return None;
      }
    };

    if !resp.status().is_success() {
      warn!(uri, status = resp.status().as_u16(), "context lookup rejected");
      return None;
    }

    match resp.json::<ContextMetadata>().await {
      Ok(meta) => Some(meta.into()),
      Err(e) => {
        warn!(uri, error = %e, "context lookup returned an unreadable body");
        None
      }
    }
  }

  /// Enrich every entry concurrently. The output is index-aligned with
  /// `entries`; one slow lookup delays the batch but no lookup affects
  /// another's result.
  pub async fn enrich_all(
    &self,
    credential: &Credential,
    entries: &[RawPresenceEntry],
  ) -> Vec<Option<EnrichedContext>> {
    join_all(
      entries
        .iter()
        .map(|entry| self.enrich(credential, entry.context_uri())),
    )
    .await
  }
}

#[cfg(test)]
mod tests {
  use earshot_core::credential::Provenance;
  use mockito::Server;
  use serde_json::json;

  use super::*;

  fn cred() -> Credential { Credential::new("tok", Provenance::Cached) }

  fn entry(context_uri: &str) -> RawPresenceEntry {
    RawPresenceEntry::decode(json!({ "track": { "context": { "uri": context_uri } } }))
      .unwrap()
  }

  #[tokio::test]
  async fn resolves_album_metadata() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/v1/albums/ABC")
      .match_header("authorization", "Bearer tok")
      .with_status(200)
      .with_body(
        json!({
          "name": "Record",
          "images": [{ "url": "https://img/1" }, { "url": "https://img/2" }],
          "external_urls": { "spotify": "https://open.spotify.com/album/ABC" }
        })
        .to_string(),
      )
      .create_async()
      .await;

    let e = ContextEnricher::new(Client::new(), server.url());
    let ctx = e.enrich(&cred(), Some("spotify:album:ABC")).await.unwrap();
    mock.assert_async().await;
    assert_eq!(ctx.name.as_deref(), Some("Record"));
    assert_eq!(ctx.url.as_deref(), Some("https://open.spotify.com/album/ABC"));
    assert_eq!(ctx.image_url.as_deref(), Some("https://img/1"));
  }

  #[tokio::test]
  async fn unsupported_or_malformed_uris_make_no_request() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", mockito::Matcher::Any)
      .expect(0)
      .create_async()
      .await;

    let e = ContextEnricher::new(Client::new(), server.url());
    for uri in [None, Some(""), Some("spotify:show:1"), Some("spotify:album"), Some("x:y:z")] {
      assert_eq!(e.enrich(&cred(), uri).await, None, "{uri:?}");
    }
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn failed_lookup_is_none() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("GET", "/v1/playlists/P")
      .with_status(404)
      .with_body(r#"{"error":{"status":404}}"#)
      .create_async()
      .await;

    let e = ContextEnricher::new(Client::new(), server.url());
    assert_eq!(e.enrich(&cred(), Some("spotify:playlist:P")).await, None);
  }

  #[tokio::test]
  async fn unreadable_body_is_none() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("GET", "/v1/artists/A")
      .with_status(200)
      .with_body("not json")
      .create_async()
      .await;

    let e = ContextEnricher::new(Client::new(), server.url());
    assert_eq!(e.enrich(&cred(), Some("spotify:artist:A")).await, None);
  }

  #[tokio::test]
  async fn one_failure_leaves_siblings_intact() {
    let mut server = Server::new_async().await;
    let _ok = server
      .mock("GET", "/v1/albums/GOOD")
      .with_status(200)
      .with_body(r#"{"name":"Good"}"#)
      .create_async()
      .await;
    let _bad = server
      .mock("GET", "/v1/albums/BAD")
      .with_status(500)
      .create_async()
      .await;

    let e = ContextEnricher::new(Client::new(), server.url());
    let entries = [
      entry("spotify:album:GOOD"),
      entry("spotify:album:BAD"),
      entry("spotify:show:X"),
      entry("spotify:album:GOOD"),
    ];
    let out = e.enrich_all(&cred(), &entries).await;

    assert_eq!(out.len(), 4);
    assert_eq!(out[0].as_ref().and_then(|c| c.name.as_deref()), Some("Good"));
    assert_eq!(out[1], None);
    assert_eq!(out[2], None);
    assert_eq!(out[3].as_ref().and_then(|c| c.name.as_deref()), Some("Good"));
  }
}
