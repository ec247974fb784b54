//! HTTP client for the social-actions backend: shared track records and
//! per-user likes.
//!
//! The backend authenticates with its own bearer token, unrelated to the
//! provider credential the sync pipeline resolves.

pub mod client;
pub mod error;
pub mod model;

pub use client::{DEFAULT_BASE_URL, SocialClient, SocialConfig};
pub use error::{Result, SocialError};
pub use model::{
  Like, LikeOutcome, Pagination, Track, TrackLikes, TrackPage, TrackQuery, TrackUpsert,
};
