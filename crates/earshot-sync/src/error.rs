//! Error taxonomy for a pipeline cycle.
//!
//! Every failure that can end a cycle is one of the [`CycleError`] variants;
//! the `Display` text is what callers see in `PipelineResult::error`.
//! Enrichment failures never appear here: they are absorbed where they
//! happen. Per-entry failures are [`ExtractionError`] and only drop the entry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CycleError {
  /// No cached credential and no open page of the provider's web player.
  #[error(
    "Please open Spotify Web Player (open.spotify.com) to load friend activity"
  )]
  NoHostPage,

  /// A host page was open but held no credential.
  #[error(
    "Could not retrieve Spotify token. Please make sure you're logged in to Spotify Web Player."
  )]
  NoCredential,

  /// The presence API rejected the credential; it has been invalidated.
  #[error("Spotify rejected the access token. Please refresh or try again later.")]
  Unauthorized,

  #[error("Spotify API returned {status}. Please refresh or try again later.")]
  ServerError { status: u16 },

  #[error("Spotify returned an empty response")]
  EmptyBody,

  #[error("Error parsing Spotify response: {0}")]
  MalformedBody(#[source] serde_json::Error),

  /// The request never produced a response (DNS, TLS, timeout, ...).
  #[error("Could not reach Spotify: {0}")]
  Transport(#[source] reqwest::Error),
}

impl CycleError {
  /// Short, stable label for structured logs.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::NoHostPage => "no_host_page",
      Self::NoCredential => "no_credential",
      Self::Unauthorized => "unauthorized",
      Self::ServerError { .. } => "server_error",
      Self::EmptyBody => "empty_body",
      Self::MalformedBody(_) => "malformed_body",
      Self::Transport(_) => "transport",
    }
  }

  /// Whether the failure came from the credential chain rather than the
  /// provider.
  pub fn is_credential_failure(&self) -> bool {
    matches!(self, Self::NoHostPage | Self::NoCredential | Self::Unauthorized)
  }
}

/// A single presence entry could not be turned into a record.
#[derive(Debug, Error)]
pub enum ExtractionError {
  #[error("undecodable presence entry: {0}")]
  Decode(#[from] earshot_core::Error),

  #[error("timestamp {0} is out of range")]
  TimestampOutOfRange(i64),
}
