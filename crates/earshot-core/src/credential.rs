//! The access credential used against the presence and metadata APIs.
//!
//! A credential is an opaque bearer string. Nothing about its expiry is known
//! locally; a credential is only discovered to be stale when a poll is
//! rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The authorization scheme marker the provider expects.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Where a credential came from during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  /// Read back from the credential store.
  Cached,
  /// Pulled out of an open host page and written back to the store.
  Extracted,
}

/// A bearer credential plus the source it was resolved from.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
  token:      String,
  provenance: Provenance,
}

impl Credential {
  pub fn new(token: impl Into<String>, provenance: Provenance) -> Self {
    Self { token: token.into(), provenance }
  }

  /// The raw value as stored; may or may not carry the bearer prefix.
  pub fn token(&self) -> &str { &self.token }

  pub fn provenance(&self) -> Provenance { self.provenance }

  /// The value to send in an `Authorization` header.
  pub fn authorization(&self) -> String { normalize_bearer(&self.token) }

  /// A log-safe rendering: the first four characters and a length.
  pub fn redacted(&self) -> String { redact(&self.token) }
}

// Never print the token itself, not even under `{:?}`.
impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credential")
      .field("token", &self.redacted())
      .field("provenance", &self.provenance)
      .finish()
  }
}

/// Prefix `token` with [`BEARER_PREFIX`] unless it already carries it.
///
/// Idempotent: `normalize_bearer(&normalize_bearer(t)) == normalize_bearer(t)`.
pub fn normalize_bearer(token: &str) -> String {
  if token.starts_with(BEARER_PREFIX) {
    token.to_owned()
  } else {
    format!("{BEARER_PREFIX}{token}")
  }
}

fn redact(token: &str) -> String {
  let raw = token.strip_prefix(BEARER_PREFIX).unwrap_or(token);
  let head: String = raw.chars().take(4).collect();
  format!("{head}…({} chars)", raw.chars().count())
}
