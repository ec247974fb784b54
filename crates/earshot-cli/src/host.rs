//! [`SnapshotHost`]: a [`HostBridge`] over a directory of saved page states.
//!
//! Each `*.json` file in the directory is one open page:
//!
//! ```json
//! { "url": "https://open.spotify.com/", "local_storage": { "accessToken": "..." } }
//! ```
//!
//! The file stem is the page id. Pages are reported in file-name order.

use std::{
  collections::HashMap,
  io,
  path::{Path, PathBuf},
};

use earshot_core::host::{HostBridge, HostPage, InspectionRoutine, OriginPattern};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SnapshotError {
  #[error("failed to read snapshot directory {path:?}: {source}")]
  ReadDir {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read snapshot {path:?}: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid snapshot {path:?}: {source}")]
  Parse {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Deserialize)]
struct Snapshot {
  url:           String,
  #[serde(default)]
  local_storage: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SnapshotHost {
  dir: PathBuf,
}

impl SnapshotHost {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  pub fn dir(&self) -> &Path { &self.dir }

  fn page_path(&self, id: &str) -> PathBuf { self.dir.join(format!("{id}.json")) }

  async fn read(path: &Path) -> Result<Snapshot, SnapshotError> {
    let raw = tokio::fs::read(path)
      .await
      .map_err(|source| SnapshotError::Read { path: path.to_owned(), source })?;
    serde_json::from_slice(&raw)
      .map_err(|source| SnapshotError::Parse { path: path.to_owned(), source })
  }
}

impl HostBridge for SnapshotHost {
  type Error = SnapshotError;

  async fn query_pages(&self, pattern: &OriginPattern) -> Result<Vec<HostPage>, SnapshotError> {
    let mut dir = match tokio::fs::read_dir(&self.dir).await {
      Ok(d) => d,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(dir = ?self.dir, "snapshot directory does not exist; no pages open");
        return Ok(Vec::new());
      }
      Err(source) => return Err(SnapshotError::ReadDir { path: self.dir.clone(), source }),
    };

    let mut files = Vec::new();
    while let Some(entry) = dir
      .next_entry()
      .await
      .map_err(|source| SnapshotError::ReadDir { path: self.dir.clone(), source })?
    {
      let path = entry.path();
      if path.extension().is_some_and(|ext| ext == "json")
        && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
      {
        files.push((stem.to_owned(), path));
      }
    }
    files.sort();

    let mut pages = Vec::new();
    for (id, path) in files {
      match Self::read(&path).await {
        Ok(snapshot) if pattern.matches(&snapshot.url) => {
          pages.push(HostPage { id, url: snapshot.url });
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "skipping unreadable snapshot"),
      }
    }
    Ok(pages)
  }

  async fn execute(
    &self,
    page: &HostPage,
    routine: &InspectionRoutine,
  ) -> Result<Option<String>, SnapshotError> {
    let snapshot = Self::read(&self.page_path(&page.id)).await?;
    routine.run(|key| Ok(snapshot.local_storage.get(key).cloned()))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
      "earshot-snapshots-{tag}-{}-{}",
      std::process::id(),
      chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  fn write(dir: &Path, name: &str, body: &serde_json::Value) {
    std::fs::write(dir.join(name), body.to_string()).unwrap();
  }

  fn pattern() -> OriginPattern { OriginPattern::parse("*://open.spotify.com/*").unwrap() }

  #[tokio::test]
  async fn missing_directory_means_no_pages() {
    let host = SnapshotHost::new("/nonexistent/earshot/pages");
    assert!(host.query_pages(&pattern()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn pages_are_filtered_and_ordered() {
    let dir = temp_dir("query");
    write(&dir, "b.json", &json!({ "url": "https://open.spotify.com/playlist/1" }));
    write(&dir, "a.json", &json!({ "url": "https://open.spotify.com/" }));
    write(&dir, "c.json", &json!({ "url": "https://accounts.spotify.com/" }));
    write(&dir, "notes.txt", &json!({ "url": "https://open.spotify.com/" }));
    std::fs::write(dir.join("broken.json"), "{").unwrap();

    let pages = SnapshotHost::new(&dir).query_pages(&pattern()).await.unwrap();
    let ids: Vec<_> = pages.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);

    let _ = std::fs::remove_dir_all(&dir);
  }

  #[tokio::test]
  async fn execute_reads_local_storage_in_priority_order() {
    let dir = temp_dir("exec");
    write(
      &dir,
      "player.json",
      &json!({
        "url": "https://open.spotify.com/",
        "local_storage": { "spotifyToken": "low", "accessToken": "mid" }
      }),
    );

    let host = SnapshotHost::new(&dir);
    let page = host.query_pages(&pattern()).await.unwrap().remove(0);
    let token = host.execute(&page, &InspectionRoutine::default()).await.unwrap();
    assert_eq!(token.as_deref(), Some("mid"));

    let _ = std::fs::remove_dir_all(&dir);
  }

  #[tokio::test]
  async fn closed_page_is_an_error() {
    let dir = temp_dir("gone");
    let host = SnapshotHost::new(&dir);
    let page = HostPage { id: "gone".into(), url: "https://open.spotify.com/".into() };
    assert!(matches!(
      host.execute(&page, &InspectionRoutine::default()).await,
      Err(SnapshotError::Read { .. })
    ));

    let _ = std::fs::remove_dir_all(&dir);
  }
}
