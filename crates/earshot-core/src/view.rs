//! Display records and the published pipeline state.

use serde::{Deserialize, Serialize};

/// Seconds since the last update at or below which a friend counts as online.
pub const ONLINE_THRESHOLD_SECS: i64 = 300;

// ─── ViewRecord ──────────────────────────────────────────────────────────────

/// One friend, ready for display. All strings are non-optional; absent
/// values are already replaced by their documented fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
  pub id:            String,
  pub name:          String,
  pub track:         String,
  pub artist:        String,
  pub seconds_ago:   i64,
  pub online:        bool,
  pub context_type:  String,
  pub context_name:  String,
  pub context_url:   String,
  pub track_url:     String,
  pub artist_url:    String,
  pub profile_image: Option<String>,
}

// ─── PipelineResult ──────────────────────────────────────────────────────────

/// The only externally observed state of the pipeline.
///
/// Exactly one of `loading`, `error`, or `entries` is meaningful at a time.
/// Fields are private so the constructors below are the only way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
  entries: Vec<ViewRecord>,
  loading: bool,
  error:   Option<String>,
}

impl PipelineResult {
  /// No cycle has completed yet.
  pub fn loading() -> Self {
    Self { entries: Vec::new(), loading: true, error: None }
  }

  /// The last cycle failed; previous entries are discarded.
  pub fn failed(message: impl Into<String>) -> Self {
    Self { entries: Vec::new(), loading: false, error: Some(message.into()) }
  }

  /// The last cycle succeeded. `entries` may be empty.
  pub fn ready(entries: Vec<ViewRecord>) -> Self {
    Self { entries, loading: false, error: None }
  }

  pub fn entries(&self) -> &[ViewRecord] { &self.entries }

  pub fn is_loading(&self) -> bool { self.loading }

  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  pub fn into_entries(self) -> Vec<ViewRecord> { self.entries }
}

impl Default for PipelineResult {
  fn default() -> Self { Self::loading() }
}
