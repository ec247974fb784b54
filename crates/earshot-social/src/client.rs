//! Async HTTP client wrapping the social backend's JSON API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
  error::{Result, SocialError},
  model::{
    ErrorBody, LikeOutcome, LikedEnvelope, Track, TrackEnvelope, TrackLikes, TrackPage,
    TrackQuery, TrackUpsert,
  },
};

pub const DEFAULT_BASE_URL: &str = "https://spotify-backend-eta.vercel.app/api";

/// Connection settings for the social backend.
#[derive(Debug, Clone)]
pub struct SocialConfig {
  pub base_url: String,
  /// Bearer token; empty means not signed in.
  pub token:    String,
  pub timeout:  Duration,
}

impl Default for SocialConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_owned(),
      token:    String::new(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SocialClient {
  client: Client,
  config: SocialConfig,
}

impl SocialClient {
  pub fn new(config: SocialConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(SocialError::Transport)?;
    Ok(Self { client, config })
  }

  pub fn is_signed_in(&self) -> bool { !self.config.token.is_empty() }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.config.base_url.trim_end_matches('/'))
  }

  /// Attach the token if there is one. Used for endpoints the backend
  /// serves anonymously.
  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.is_signed_in() { req.bearer_auth(&self.config.token) } else { req }
  }

  /// Attach the token, failing before any request is sent if there is none.
  fn require_auth(&self, req: RequestBuilder) -> Result<RequestBuilder> {
    if !self.is_signed_in() {
      return Err(SocialError::Unauthenticated);
    }
    Ok(req.bearer_auth(&self.config.token))
  }

  // ── Tracks ────────────────────────────────────────────────────────────────

  /// `POST /tracks`: get-or-create by Spotify id.
  pub async fn ensure_track(&self, track: &TrackUpsert) -> Result<Track> {
    if track.spotify_id.is_empty() {
      return Err(SocialError::MissingTrackId);
    }
    let req = self.require_auth(self.client.post(self.url("/tracks")))?;
    let resp = send(req.json(&track.body())).await?;
    Ok(decode::<TrackEnvelope>(resp).await?.track)
  }

  /// `GET /tracks?spotifyId=&search=&page=&limit=`
  pub async fn list_tracks(&self, query: &TrackQuery) -> Result<TrackPage> {
    let req = self.auth(self.client.get(self.url("/tracks"))).query(&query.pairs());
    decode(send(req).await?).await
  }

  // ── Likes ─────────────────────────────────────────────────────────────────

  /// `GET /tracks/{id}/likes`
  pub async fn track_likes(&self, spotify_id: &str) -> Result<TrackLikes> {
    let path = likes_path(spotify_id)?;
    let req = self.auth(self.client.get(self.url(&path)));
    decode(send(req).await?).await
  }

  /// `POST /tracks/{id}/likes`, after making sure the track exists.
  ///
  /// A failed ensure is logged and the like is attempted anyway; the track
  /// may well exist already.
  pub async fn like_track(&self, spotify_id: &str) -> Result<LikeOutcome> {
    let path = likes_path(spotify_id)?;
    let req = self.require_auth(self.client.post(self.url(&path)))?;

    if let Err(e) = self.ensure_track(&TrackUpsert::new(spotify_id)).await {
      warn!(spotify_id, error = %e, "could not ensure track before liking");
    }

    match send(req).await {
      Ok(_) => Ok(LikeOutcome::Liked),
      Err(SocialError::Conflict(message)) => {
        debug!(spotify_id, %message, "track already liked");
        Ok(LikeOutcome::AlreadyLiked)
      }
      Err(e) => Err(e),
    }
  }

  /// `DELETE /tracks/{id}/likes`. [`SocialError::NotFound`] if there was no
  /// like to remove.
  pub async fn unlike_track(&self, spotify_id: &str) -> Result<()> {
    let path = likes_path(spotify_id)?;
    let req = self.require_auth(self.client.delete(self.url(&path)))?;
    send(req).await?;
    Ok(())
  }

  /// `GET /tracks/{id}/liked`
  pub async fn has_liked(&self, spotify_id: &str) -> Result<bool> {
    let url = self.url(&track_path(spotify_id, "liked")?);
    let req = self.require_auth(self.client.get(url))?;
    Ok(decode::<LikedEnvelope>(send(req).await?).await?.liked)
  }

  /// `GET /tracks/user/likes?page=&limit=`
  pub async fn user_likes(&self, page: u32, limit: u32) -> Result<TrackPage> {
    let req = self
      .require_auth(self.client.get(self.url("/tracks/user/likes")))?
      .query(&[("page", page), ("limit", limit)]);
    decode(send(req).await?).await
  }
}

fn likes_path(spotify_id: &str) -> Result<String> { track_path(spotify_id, "likes") }

/// `/tracks/{id}/{leaf}`. The id must be ASCII alphanumeric so it stays a
/// single path segment.
fn track_path(spotify_id: &str, leaf: &str) -> Result<String> {
  if spotify_id.is_empty() {
    return Err(SocialError::MissingTrackId);
  }
  if !spotify_id.chars().all(|c| c.is_ascii_alphanumeric()) {
    return Err(SocialError::InvalidTrackId(spotify_id.to_owned()));
  }
  Ok(format!("/tracks/{spotify_id}/{leaf}"))
}

/// Send and classify the status.
async fn send(req: RequestBuilder) -> Result<Response> {
  let resp = req.send().await.map_err(SocialError::Transport)?;
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }

  let message = resp
    .json::<ErrorBody>()
    .await
    .ok()
    .and_then(|b| b.error)
    .unwrap_or_else(|| format!("API error: {}", status.as_u16()));
  debug!(status = status.as_u16(), %message, "social request rejected");

  Err(match status {
    StatusCode::UNAUTHORIZED => SocialError::Unauthorized,
    StatusCode::CONFLICT => SocialError::Conflict(message),
    StatusCode::NOT_FOUND => SocialError::NotFound(message),
    _ => SocialError::Server { status: status.as_u16(), message },
  })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
  resp.json().await.map_err(SocialError::Decode)
}
