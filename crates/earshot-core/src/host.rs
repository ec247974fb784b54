//! The host-bridge capability: finding an open page of the provider's web
//! application and running an inspection routine inside it.
//!
//! How a routine actually reaches a page is platform specific (browser
//! automation, an extension messaging channel, saved snapshots). The pipeline
//! only sees [`HostBridge`].

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Local-storage keys the provider's web player has been seen to use for its
/// access token, most specific first.
pub const TOKEN_STORAGE_KEYS: [&str; 3] =
  ["accessTokenBackup", "accessToken", "spotifyToken"];

// ─── Pages ───────────────────────────────────────────────────────────────────

/// An open page that an inspection routine can be executed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPage {
  /// Bridge-assigned handle (tab id, snapshot file name, ...).
  pub id:  String,
  pub url: String,
}

/// A URL match pattern of the form `<scheme>://<host>/<path>`, where the
/// scheme may be `*` and a trailing `*` on the path matches any suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPattern {
  scheme: Option<String>,
  host:   String,
  path:   PathMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathMatch {
  Exact(String),
  Prefix(String),
}

impl OriginPattern {
  /// Parse a pattern such as `*://open.spotify.com/*`. Returns `None` if it
  /// lacks a `://` separator or a host.
  pub fn parse(pattern: &str) -> Option<Self> {
    let (scheme, rest) = pattern.split_once("://")?;
    let (host, path) = match rest.find('/') {
      Some(i) => (&rest[..i], &rest[i..]),
      None => (rest, "/"),
    };
    if host.is_empty() {
      return None;
    }
    let path = match path.strip_suffix('*') {
      Some(prefix) => PathMatch::Prefix(prefix.to_owned()),
      None => PathMatch::Exact(path.to_owned()),
    };
    Some(Self {
      scheme: (scheme != "*").then(|| scheme.to_owned()),
      host: host.to_ascii_lowercase(),
      path,
    })
  }

  pub fn matches(&self, url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
      return false;
    };
    if let Some(want) = &self.scheme
      && !want.eq_ignore_ascii_case(scheme)
    {
      return false;
    }
    let (host, path) = match rest.find('/') {
      Some(i) => (&rest[..i], &rest[i..]),
      None => (rest, "/"),
    };
    if !host.eq_ignore_ascii_case(&self.host) {
      return false;
    }
    match &self.path {
      PathMatch::Exact(p) => path == p,
      PathMatch::Prefix(p) => path.starts_with(p.as_str()),
    }
  }
}

// ─── Inspection routine ──────────────────────────────────────────────────────

/// A no-argument routine that reads local-storage keys in priority order and
/// yields the first non-empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRoutine {
  pub keys: Vec<String>,
}

impl Default for InspectionRoutine {
  fn default() -> Self {
    Self { keys: TOKEN_STORAGE_KEYS.iter().map(|k| (*k).to_owned()).collect() }
  }
}

impl InspectionRoutine {
  /// Run against a page's storage, given a reader for single keys.
  ///
  /// The reader's error aborts the routine; an empty string is skipped like a
  /// missing key.
  pub fn run<F, E>(&self, mut read: F) -> Result<Option<String>, E>
  where
    F: FnMut(&str) -> Result<Option<String>, E>,
  {
    for key in &self.keys {
      if let Some(value) = read(key)?.filter(|v| !v.is_empty()) {
        return Ok(Some(value));
      }
    }
    Ok(None)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Access to open pages of the provider's web application.
pub trait HostBridge: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All open pages whose URL matches `pattern`, in the bridge's order.
  fn query_pages<'a>(
    &'a self,
    pattern: &'a OriginPattern,
  ) -> impl Future<Output = Result<Vec<HostPage>, Self::Error>> + Send + 'a;

  /// Execute `routine` inside `page` and return its value.
  fn execute<'a>(
    &'a self,
    page: &'a HostPage,
    routine: &'a InspectionRoutine,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;
}
