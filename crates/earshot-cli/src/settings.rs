//! Layered configuration: defaults, then `earshot.toml`, then `EARSHOT_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use earshot_social::{DEFAULT_BASE_URL, SocialConfig};
use earshot_sync::{PipelineConfig, config as defaults};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "EARSHOT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub poll_interval_secs:   u64,
  pub request_timeout_secs: u64,
  pub presence_root:        String,
  pub api_root:             String,
  pub web_root:             String,
  pub host_origin:          String,
  pub app_version:          String,
  pub store_path:           PathBuf,
  /// Second SQLite file the credential is mirrored to. Off when unset.
  pub backup_store_path:    Option<PathBuf>,
  pub snapshot_dir:         PathBuf,
  pub social:               SocialSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SocialSettings {
  pub base_url: String,
  pub token:    String,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      poll_interval_secs:   defaults::DEFAULT_POLL_INTERVAL.as_secs(),
      request_timeout_secs: defaults::DEFAULT_REQUEST_TIMEOUT.as_secs(),
      presence_root:        defaults::DEFAULT_PRESENCE_ROOT.to_owned(),
      api_root:             defaults::DEFAULT_API_ROOT.to_owned(),
      web_root:             defaults::DEFAULT_WEB_ROOT.to_owned(),
      host_origin:          defaults::DEFAULT_HOST_ORIGIN.to_owned(),
      app_version:          defaults::DEFAULT_APP_VERSION.to_owned(),
      store_path:           PathBuf::from("~/.local/share/earshot/credentials.db"),
      backup_store_path:    None,
      snapshot_dir:         PathBuf::from("~/.local/share/earshot/pages"),
      social:               SocialSettings::default(),
    }
  }
}

impl Default for SocialSettings {
  fn default() -> Self {
    Self { base_url: DEFAULT_BASE_URL.to_owned(), token: String::new() }
  }
}

/// `EARSHOT_POLL_INTERVAL_SECS=30`, `EARSHOT_SOCIAL__TOKEN=...`
pub fn environment() -> Environment {
  Environment::with_prefix(ENV_PREFIX)
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}

impl Settings {
  /// Load from `path` (optional) and the process environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::load_with(path, environment())
  }

  pub fn load_with(path: &Path, env: Environment) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path.to_path_buf()).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  pub fn pipeline(&self) -> PipelineConfig {
    PipelineConfig {
      poll_interval: Duration::from_secs(self.poll_interval_secs),
      request_timeout: Duration::from_secs(self.request_timeout_secs),
      presence_root: self.presence_root.clone(),
      api_root: self.api_root.clone(),
      web_root: self.web_root.clone(),
      host_origin: self.host_origin.clone(),
      app_version: self.app_version.clone(),
      ..PipelineConfig::default()
    }
  }

  pub fn social(&self) -> SocialConfig {
    SocialConfig {
      base_url: self.social.base_url.clone(),
      token: self.social.token.clone(),
      timeout: Duration::from_secs(self.request_timeout_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
