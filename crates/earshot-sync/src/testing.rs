//! In-crate fakes shared by the unit tests.

use std::{
  collections::HashMap,
  io,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use earshot_core::{
  host::{HostBridge, HostPage, InspectionRoutine, OriginPattern},
  store::CredentialStore,
};

// ─── Host ────────────────────────────────────────────────────────────────────

/// A host bridge over a fixed set of pages with in-memory local storage.
#[derive(Clone, Default)]
pub struct FakeHost {
  pages:       Vec<HostPage>,
  storage:     HashMap<String, HashMap<String, String>>,
  unreachable: Vec<String>,
  query_fails: bool,
  executions:  Arc<AtomicUsize>,
  executed_on: Arc<Mutex<Vec<String>>>,
}

impl FakeHost {
  pub fn empty() -> Self { Self::default() }

  /// Add an open page whose local storage holds `entries`.
  pub fn with_page(mut self, id: &str, url: &str, entries: &[(&str, &str)]) -> Self {
    self.pages.push(HostPage { id: id.to_owned(), url: url.to_owned() });
    self.storage.insert(
      id.to_owned(),
      entries
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect(),
    );
    self
  }

  /// Make executing the routine in page `id` fail.
  pub fn unreachable(mut self, id: &str) -> Self {
    self.unreachable.push(id.to_owned());
    self
  }

  pub fn failing_query(mut self) -> Self {
    self.query_fails = true;
    self
  }

  pub fn executions(&self) -> usize { self.executions.load(Ordering::SeqCst) }

  pub fn executed_on(&self) -> Vec<String> {
    self.executed_on.lock().unwrap().clone()
  }
}

impl HostBridge for FakeHost {
  type Error = io::Error;

  async fn query_pages(&self, pattern: &OriginPattern) -> io::Result<Vec<HostPage>> {
    if self.query_fails {
      return Err(io::Error::other("host unavailable"));
    }
    Ok(
      self
        .pages
        .iter()
        .filter(|p| pattern.matches(&p.url))
        .cloned()
        .collect(),
    )
  }

  async fn execute(
    &self,
    page: &HostPage,
    routine: &InspectionRoutine,
  ) -> io::Result<Option<String>> {
    self.executions.fetch_add(1, Ordering::SeqCst);
    self.executed_on.lock().unwrap().push(page.id.clone());
    if self.unreachable.contains(&page.id) {
      return Err(io::Error::other("cannot access contents of page"));
    }
    let storage = self.storage.get(&page.id).cloned().unwrap_or_default();
    routine.run(|k| Ok(storage.get(k).cloned()))
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A store that fails every operation.
#[derive(Clone, Default)]
pub struct BrokenStore;

impl CredentialStore for BrokenStore {
  type Error = io::Error;

  async fn get(&self, _: &str) -> io::Result<Option<String>> {
    Err(io::Error::other("store offline"))
  }

  async fn set(&self, _: &str, _: &str) -> io::Result<()> {
    Err(io::Error::other("store offline"))
  }

  async fn remove(&self, _: &str) -> io::Result<()> {
    Err(io::Error::other("store offline"))
  }
}

pub const WEB_PLAYER: &str = "https://open.spotify.com/";
