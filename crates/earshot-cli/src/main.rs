//! `earshot`: friend activity in the terminal.
//!
//! # Usage
//!
//! ```
//! earshot                      # poll and print on every update
//! earshot once                 # one cycle, then exit
//! earshot --interval 30 watch
//! earshot like 4uLU6hMCjMI75M1A2tKUQC
//! ```
//!
//! Settings come from `earshot.toml` (or `--config`) and `EARSHOT_*`
//! environment variables; see `settings.rs` for the keys.

mod host;
mod render;
mod settings;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use earshot_core::store::{CredentialStore, MirroredStore};
use earshot_social::{LikeOutcome, SocialClient};
use earshot_store_sqlite::SqliteStore;
use earshot_sync::{Pipeline, PollScheduler, cache::CredentialCache};
use host::SnapshotHost;
use settings::{Settings, expand_tilde};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "earshot", version, about = "Friend activity from the terminal")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "earshot.toml")]
  config: PathBuf,

  /// Seconds between polls; overrides `poll_interval_secs`.
  #[arg(long, value_name = "SECS")]
  interval: Option<u64>,

  /// Credential database; overrides `store_path`.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
  /// Poll on an interval and print every update (default).
  Watch,
  /// Run a single cycle and print it.
  Once,
  /// Forget the cached access token.
  Logout,
  /// Like a track on the social backend.
  Like { track_id: String },
  /// Remove a like.
  Unlike { track_id: String },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)
    .with_context(|| format!("failed to load settings from {:?}", cli.config))?;
  if let Some(secs) = cli.interval {
    settings.poll_interval_secs = secs;
  }
  if let Some(path) = cli.store {
    settings.store_path = path;
  }

  let command = cli.command.unwrap_or(Command::Watch);
  match command {
    Command::Like { track_id } => return like(&settings, &track_id).await,
    Command::Unlike { track_id } => return unlike(&settings, &track_id).await,
    _ => {}
  }

  let store_path = expand_tilde(&settings.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match &settings.backup_store_path {
    Some(backup) => {
      let backup_path = expand_tilde(backup);
      let backup = SqliteStore::open(&backup_path)
        .await
        .with_context(|| format!("failed to open backup store at {backup_path:?}"))?;
      run(command, &settings, MirroredStore::new(store, backup)).await
    }
    None => run(command, &settings, store).await,
  }
}

// ─── Pipeline commands ───────────────────────────────────────────────────────

async fn run<S>(command: Command, settings: &Settings, store: S) -> anyhow::Result<()>
where
  S: CredentialStore + 'static,
{
  let config = settings.pipeline();

  if let Command::Logout = command {
    CredentialCache::with_key(store, config.credential_key)
      .invalidate()
      .await
      .context("failed to clear cached token")?;
    println!("Signed out.");
    return Ok(());
  }

  let host = SnapshotHost::new(expand_tilde(&settings.snapshot_dir));
  let pipeline = Pipeline::new(&config, store, host).context("failed to build HTTP client")?;

  match command {
    Command::Once => {
      let result = pipeline.poll().await;
      println!("{}", render::render(&result));
      if let Some(error) = result.error() {
        bail!("{error}");
      }
      Ok(())
    }
    _ => watch(pipeline, config.poll_interval).await,
  }
}

async fn watch<S>(pipeline: Pipeline<S, SnapshotHost>, interval: Duration) -> anyhow::Result<()>
where
  S: CredentialStore + 'static,
{
  let handle = PollScheduler::new(Arc::new(pipeline), interval).spawn();
  let mut updates = handle.subscribe();

  loop {
    tokio::select! {
      changed = updates.changed() => {
        if changed.is_err() {
          break;
        }
        println!("{}\n", render::render(&updates.borrow_and_update()));
      }
      _ = tokio::signal::ctrl_c() => {
        info!("interrupted");
        break;
      }
    }
  }

  handle.shutdown();
  Ok(())
}

// ─── Social commands ─────────────────────────────────────────────────────────

async fn like(settings: &Settings, track_id: &str) -> anyhow::Result<()> {
  let client = SocialClient::new(settings.social()).context("failed to build HTTP client")?;
  match client.like_track(track_id).await.context("like failed")? {
    LikeOutcome::Liked => println!("Liked {track_id}."),
    LikeOutcome::AlreadyLiked => println!("Already liked {track_id}."),
  }
  Ok(())
}

async fn unlike(settings: &Settings, track_id: &str) -> anyhow::Result<()> {
  let client = SocialClient::new(settings.social()).context("failed to build HTTP client")?;
  client.unlike_track(track_id).await.context("unlike failed")?;
  println!("Removed like from {track_id}.");
  Ok(())
}
