use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocialError {
  /// No token is configured; raised before any request is made.
  #[error("authentication required: no social token configured")]
  Unauthenticated,

  #[error("track id is required")]
  MissingTrackId,

  /// The id is not a plain base-62 token and cannot be placed in a path.
  #[error("invalid track id {0:?}")]
  InvalidTrackId(String),

  #[error("social backend rejected the token")]
  Unauthorized,

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  NotFound(String),

  /// Any other non-success status. `message` is the backend's `error` field
  /// when it sent one.
  #[error("social backend returned {status}: {message}")]
  Server { status: u16, message: String },

  #[error("could not reach social backend: {0}")]
  Transport(#[source] reqwest::Error),

  #[error("unexpected response from social backend: {0}")]
  Decode(#[source] reqwest::Error),
}

pub type Result<T, E = SocialError> = std::result::Result<T, E>;
