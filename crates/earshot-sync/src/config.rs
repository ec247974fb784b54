//! Runtime configuration for the pipeline.

use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PRESENCE_ROOT: &str = "https://guc-spclient.spotify.com";
pub const DEFAULT_API_ROOT: &str = "https://api.spotify.com";
pub const DEFAULT_WEB_ROOT: &str = "https://open.spotify.com";
pub const DEFAULT_HOST_ORIGIN: &str = "*://open.spotify.com/*";
pub const DEFAULT_APP_VERSION: &str = "1.2.0";
pub const DEFAULT_CREDENTIAL_KEY: &str = "accessToken";

/// Everything a [`Pipeline`](crate::Pipeline) needs besides its store and
/// host bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
  /// Time between the start of consecutive cycles.
  pub poll_interval:   Duration,
  /// Per-request limit applied by the HTTP client to every call.
  pub request_timeout: Duration,
  /// Base of the presence API (`{root}/presence-view/v1/buddylist`).
  pub presence_root:   String,
  /// Base of the metadata API (`{root}/v1/{type}s/{id}`).
  pub api_root:        String,
  /// Base of the provider's web application, used for navigation URLs.
  pub web_root:        String,
  /// URL pattern identifying host pages to extract a credential from.
  pub host_origin:     String,
  /// Sent as `Spotify-App-Version` on presence requests.
  pub app_version:     String,
  /// Store key the credential lives under.
  pub credential_key:  String,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      poll_interval:   DEFAULT_POLL_INTERVAL,
      request_timeout: DEFAULT_REQUEST_TIMEOUT,
      presence_root:   DEFAULT_PRESENCE_ROOT.to_owned(),
      api_root:        DEFAULT_API_ROOT.to_owned(),
      web_root:        DEFAULT_WEB_ROOT.to_owned(),
      host_origin:     DEFAULT_HOST_ORIGIN.to_owned(),
      app_version:     DEFAULT_APP_VERSION.to_owned(),
      credential_key:  DEFAULT_CREDENTIAL_KEY.to_owned(),
    }
  }
}
