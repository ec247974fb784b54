//! Request and response shapes of the social backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

// ─── Requests ────────────────────────────────────────────────────────────────

/// Input to get-or-create a track. Only the Spotify id is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackUpsert {
  pub spotify_id: String,
  pub name:       Option<String>,
  pub artist:     Option<String>,
  pub album:      Option<String>,
  pub image_url:  Option<String>,
}

impl TrackUpsert {
  pub fn new(spotify_id: impl Into<String>) -> Self {
    Self { spotify_id: spotify_id.into(), ..Self::default() }
  }

  /// The request body, with the backend's required fields filled in.
  pub(crate) fn body(&self) -> TrackBody<'_> {
    TrackBody {
      spotify_id: &self.spotify_id,
      name:       self.name.as_deref().unwrap_or(UNKNOWN_TRACK),
      artist:     self.artist.as_deref().unwrap_or(UNKNOWN_ARTIST),
      album:      self.album.as_deref().unwrap_or_default(),
      image_url:  self.image_url.as_deref().unwrap_or_default(),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrackBody<'a> {
  spotify_id: &'a str,
  name:       &'a str,
  artist:     &'a str,
  album:      &'a str,
  image_url:  &'a str,
}

/// Filters for `GET /tracks`. `spotify_id` takes precedence over `search`
/// on the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackQuery {
  pub spotify_id: Option<String>,
  pub search:     Option<String>,
  pub page:       Option<u32>,
  pub limit:      Option<u32>,
}

impl TrackQuery {
  pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
    let mut q = Vec::new();
    if let Some(id) = &self.spotify_id {
      q.push(("spotifyId", id.clone()));
    }
    if let Some(s) = &self.search {
      q.push(("search", s.clone()));
    }
    if let Some(p) = self.page {
      q.push(("page", p.to_string()));
    }
    if let Some(l) = self.limit {
      q.push(("limit", l.to_string()));
    }
    q
  }
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Track {
  pub id:         i64,
  pub spotify_id: String,
  pub name:       String,
  pub artist:     String,
  #[serde(default)]
  pub album:      Option<String>,
  #[serde(default)]
  pub image_url:  Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  /// Present on user-likes listings.
  #[serde(default)]
  pub liked_at:   Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Like {
  pub id:            i64,
  pub user_id:       i64,
  pub username:      String,
  #[serde(default)]
  pub profile_image: Option<String>,
  #[serde(default)]
  pub created_at:    Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackLikes {
  pub likes: Vec<Like>,
  pub track: Track,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
  pub total: u64,
  pub page:  u32,
  pub limit: u32,
  pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackPage {
  pub tracks:     Vec<Track>,
  pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackEnvelope {
  pub track: Track,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikedEnvelope {
  pub liked: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
  pub error: Option<String>,
}

/// Result of liking a track. Liking twice is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
  Liked,
  AlreadyLiked,
}
