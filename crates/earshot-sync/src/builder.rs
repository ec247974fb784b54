//! View model builder: raw entries plus enrichment in, display records out.
//!
//! Pure. The current time is an argument so results are reproducible.

use chrono::{DateTime, Utc};
use earshot_core::{
  presence::{EnrichedContext, RawPresenceEntry, RawTrack},
  uri::{self, URI_SCHEME},
  view::{ONLINE_THRESHOLD_SECS, ViewRecord},
};
use tracing::warn;

use crate::error::ExtractionError;

pub const UNKNOWN_ID: &str = "unknown";
pub const UNKNOWN_FRIEND: &str = "Unknown Friend";
pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Stand-in for one unnamed artist inside a multi-artist list.
pub const UNNAMED_ARTIST: &str = "Unknown";

pub struct ViewBuilder {
  web_root: String,
}

impl ViewBuilder {
  pub fn new(web_root: impl Into<String>) -> Self {
    let web_root: String = web_root.into();
    Self { web_root: web_root.trim_end_matches('/').to_owned() }
  }

  /// Build one record. Only an unrepresentable timestamp fails; every other
  /// missing field takes its fallback.
  pub fn build(
    &self,
    raw: &RawPresenceEntry,
    enriched: Option<&EnrichedContext>,
    now: DateTime<Utc>,
  ) -> Result<ViewRecord, ExtractionError> {
    let seconds_ago = seconds_ago(raw.timestamp, now.timestamp_millis())?;
    let track = raw.track.as_ref();

    let (context_type, context_id) = uri::type_and_id(raw.context_uri().unwrap_or_default());
    let derived_context_url = if !context_type.is_empty() && !context_id.is_empty() {
      format!("{}/{context_type}/{context_id}", self.web_root)
    } else {
      String::new()
    };

    let track_url = match raw.track_uri().and_then(uri::last_segment) {
      Some(id) if context_type == "album" && !derived_context_url.is_empty() => {
        format!("{derived_context_url}?highlight={URI_SCHEME}:track:{id}")
      }
      Some(id) => format!("{}/track/{id}", self.web_root),
      None => String::new(),
    };

    let artist_url = track
      .and_then(|t| t.artist_uri.as_deref())
      .and_then(uri::last_segment)
      .map(|id| format!("{}/artist/{id}", self.web_root))
      .unwrap_or_default();

    let context_name = enriched
      .and_then(|c| c.name.as_deref())
      .filter(|n| !n.is_empty())
      .or(raw.context_name())
      .unwrap_or_default()
      .to_owned();

    let context_url = enriched
      .and_then(|c| c.url.clone())
      .filter(|u| !u.is_empty())
      .unwrap_or(derived_context_url);

    Ok(ViewRecord {
      id: non_empty(raw.user_id.as_deref()).unwrap_or(UNKNOWN_ID).to_owned(),
      name: non_empty(raw.user_name.as_deref())
        .or_else(|| non_empty(raw.user.as_ref()?.name.as_deref()))
        .unwrap_or(UNKNOWN_FRIEND)
        .to_owned(),
      track: track
        .and_then(|t| t.name.clone())
        .unwrap_or_else(|| UNKNOWN_TRACK.to_owned()),
      artist: artist_display(track),
      seconds_ago,
      online: seconds_ago <= ONLINE_THRESHOLD_SECS,
      context_type: context_type.to_owned(),
      context_name,
      context_url,
      track_url,
      artist_url,
      profile_image: raw
        .user
        .as_ref()
        .and_then(|u| u.image_url.clone())
        .filter(|u| !u.is_empty()),
    })
  }

  /// Build the whole batch. `enriched` is index-aligned with `entries`;
  /// entries whose extraction fails are logged and left out.
  pub fn build_all(
    &self,
    entries: &[RawPresenceEntry],
    enriched: &[Option<EnrichedContext>],
    now: DateTime<Utc>,
  ) -> Vec<ViewRecord> {
    entries
      .iter()
      .enumerate()
      .filter_map(|(i, raw)| {
        let context = enriched.get(i).and_then(Option::as_ref);
        match self.build(raw, context, now) {
          Ok(record) => Some(record),
          Err(e) => {
            warn!(user_id = raw.user_id.as_deref(), error = %e, "dropping presence entry");
            None
          }
        }
      })
      .collect()
  }
}

/// `round((now - timestamp) / 1000)`, rounding halves up. A missing or zero
/// timestamp means "just now".
pub fn seconds_ago(timestamp_ms: Option<i64>, now_ms: i64) -> Result<i64, ExtractionError> {
  let Some(ts) = timestamp_ms.filter(|&ts| ts != 0) else {
    return Ok(0);
  };
  now_ms
    .checked_sub(ts)
    .and_then(|elapsed| elapsed.checked_add(500))
    .map(|shifted| shifted.div_euclid(1000))
    .ok_or(ExtractionError::TimestampOutOfRange(ts))
}

/// Artist line: the `artists` list joined with `", "`, else the singular
/// `artist.name`, else [`UNKNOWN_ARTIST`].
pub fn artist_display(track: Option<&RawTrack>) -> String {
  let Some(track) = track else {
    return UNKNOWN_ARTIST.to_owned();
  };
  if let Some(artists) = track.artists.as_deref().filter(|a| !a.is_empty()) {
    return artists
      .iter()
      .map(|a| non_empty(a.name()).unwrap_or(UNNAMED_ARTIST))
      .collect::<Vec<_>>()
      .join(", ");
  }
  track
    .artist
    .as_ref()
    .and_then(|a| non_empty(a.name.as_deref()))
    .unwrap_or(UNKNOWN_ARTIST)
    .to_owned()
}

fn non_empty(s: Option<&str>) -> Option<&str> { s.filter(|s| !s.is_empty()) }
