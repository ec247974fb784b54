//! Helpers for the provider's colon-delimited URIs (`spotify:type:id`).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const URI_SCHEME: &str = "spotify";

/// Context types the metadata API can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
  Album,
  Playlist,
  Artist,
}

impl ContextKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Album => "album",
      Self::Playlist => "playlist",
      Self::Artist => "artist",
    }
  }

  /// Collection segment used by the metadata API (`/v1/albums/...`).
  pub fn collection(self) -> &'static str {
    match self {
      Self::Album => "albums",
      Self::Playlist => "playlists",
      Self::Artist => "artists",
    }
  }
}

impl fmt::Display for ContextKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ContextKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "album" => Ok(Self::Album),
      "playlist" => Ok(Self::Playlist),
      "artist" => Ok(Self::Artist),
      other => Err(Error::UnsupportedContext(other.to_owned())),
    }
  }
}

/// A validated `spotify:<kind>:<id>` context reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRef {
  pub kind: ContextKind,
  pub id:   String,
}

impl FromStr for ContextRef {
  type Err = Error;

  fn from_str(uri: &str) -> Result<Self> {
    let mut parts = uri.split(':');
    let (Some(scheme), Some(kind), Some(id), None) =
      (parts.next(), parts.next(), parts.next(), parts.next())
    else {
      return Err(Error::MalformedUri(uri.to_owned()));
    };
    if scheme != URI_SCHEME || kind.is_empty() || id.is_empty() {
      return Err(Error::MalformedUri(uri.to_owned()));
    }
    Ok(Self { kind: kind.parse()?, id: id.to_owned() })
  }
}

/// Segments 1 and 2 of a colon-delimited URI, unvalidated.
///
/// Missing segments come back as empty strings, matching how navigation URLs
/// are derived for arbitrary context types.
pub fn type_and_id(uri: &str) -> (&str, &str) {
  let mut parts = uri.split(':').skip(1);
  (parts.next().unwrap_or_default(), parts.next().unwrap_or_default())
}

/// The final colon-delimited segment, or `None` if it is empty.
pub fn last_segment(uri: &str) -> Option<&str> {
  uri.rsplit(':').next().filter(|s| !s.is_empty())
}
