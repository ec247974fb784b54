//! Raw presence entries as reported by the provider's buddy-list endpoint.
//!
//! Every field is optional: the provider omits fields freely and the view
//! builder supplies fallbacks. A field present with an unexpected shape reads
//! as absent. Only the timestamp is strict: it must be a number (integer or
//! float milliseconds) or null, otherwise the entry fails to decode.

use serde::{
  Deserialize, Deserializer, Serialize,
  de::{DeserializeOwned, Error as _},
};
use serde_json::Value;

use crate::Result;

// ─── Entry ───────────────────────────────────────────────────────────────────

/// One friend's current state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPresenceEntry {
  #[serde(default, deserialize_with = "lenient")]
  pub user_id:   Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub user_name: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub user:      Option<RawUser>,
  #[serde(default, deserialize_with = "lenient")]
  pub track:     Option<RawTrack>,
  /// Last update, epoch milliseconds.
  #[serde(default, deserialize_with = "epoch_millis")]
  pub timestamp: Option<i64>,
}

impl RawPresenceEntry {
  /// Decode a single element of the `friends` array.
  pub fn decode(value: serde_json::Value) -> Result<Self> {
    Ok(serde_json::from_value(value)?)
  }

  pub fn track_uri(&self) -> Option<&str> {
    self.track.as_ref()?.uri.as_deref().filter(|u| !u.is_empty())
  }

  pub fn context_uri(&self) -> Option<&str> {
    self
      .track
      .as_ref()?
      .context
      .as_ref()?
      .uri
      .as_deref()
      .filter(|u| !u.is_empty())
  }

  pub fn context_name(&self) -> Option<&str> {
    self
      .track
      .as_ref()?
      .context
      .as_ref()?
      .name
      .as_deref()
      .filter(|n| !n.is_empty())
  }
}

// ─── Nested shapes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
  #[serde(default, deserialize_with = "lenient")]
  pub name:      Option<String>,
  #[serde(rename = "imageUrl", default, deserialize_with = "lenient")]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
  #[serde(default, deserialize_with = "lenient")]
  pub name:       Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub uri:        Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub artist_uri: Option<String>,
  /// Either bare names or `{name}` objects; the provider has sent both.
  #[serde(default, deserialize_with = "lenient")]
  pub artists:    Option<Vec<ArtistRef>>,
  /// Singular form some payloads use instead of `artists`.
  #[serde(default, deserialize_with = "lenient")]
  pub artist:     Option<RawArtist>,
  #[serde(default, deserialize_with = "lenient")]
  pub context:    Option<RawContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArtist {
  #[serde(default, deserialize_with = "lenient")]
  pub name: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub uri:  Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtistRef {
  Name(String),
  Object(RawArtist),
  /// `null`, a number, or anything else without a usable name.
  Other(Value),
}

impl ArtistRef {
  pub fn name(&self) -> Option<&str> {
    match self {
      Self::Name(n) => Some(n.as_str()),
      Self::Object(a) => a.name.as_deref(),
      Self::Other(_) => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContext {
  #[serde(default, deserialize_with = "lenient")]
  pub uri:  Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub name: Option<String>,
}

// ─── Field decoding ──────────────────────────────────────────────────────────

/// Decode the field as `T`, or `None` when it has any other shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  let value = Value::deserialize(deserializer)?;
  Ok(serde_json::from_value(value).ok())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Millis {
  Int(i64),
  Float(f64),
}

/// Epoch milliseconds as an integer or a float, rounded to the nearest
/// millisecond. Strings and out-of-range floats are errors.
fn epoch_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  match Option::<Millis>::deserialize(deserializer)? {
    None => Ok(None),
    Some(Millis::Int(ms)) => Ok(Some(ms)),
    Some(Millis::Float(ms)) if ms.is_finite() && ms >= i64::MIN as f64 && ms < i64::MAX as f64 => {
      Ok(Some(ms.round() as i64))
    }
    Some(Millis::Float(ms)) => Err(D::Error::custom(format!("timestamp {ms} is out of range"))),
  }
}

// ─── Enrichment ──────────────────────────────────────────────────────────────

/// Result of a context metadata lookup. Absent entirely when the context is
/// unsupported or the lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedContext {
  pub name:      Option<String>,
  /// Canonical navigation URL (`external_urls.spotify`).
  pub url:       Option<String>,
  pub image_url: Option<String>,
}
