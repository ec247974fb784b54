//! Remote extraction fallback: pull a credential out of an open host page.
//!
//! Every failure on this path collapses to `None`. The resolver relies on
//! that to tell "no page" apart from "page without a credential" without
//! having to interpret bridge errors.

use earshot_core::host::{HostBridge, HostPage, InspectionRoutine, OriginPattern};
use tracing::{debug, warn};

pub struct HostExtractor<H> {
  bridge:  H,
  pattern: Option<OriginPattern>,
  routine: InspectionRoutine,
}

impl<H: HostBridge> HostExtractor<H> {
  /// `origin` is a match pattern such as `*://open.spotify.com/*`. An
  /// unparseable pattern matches nothing.
  pub fn new(bridge: H, origin: &str) -> Self {
    let pattern = OriginPattern::parse(origin);
    if pattern.is_none() {
      warn!(origin, "host origin pattern is invalid; extraction disabled");
    }
    Self { bridge, pattern, routine: InspectionRoutine::default() }
  }

  pub fn with_routine(mut self, routine: InspectionRoutine) -> Self {
    self.routine = routine;
    self
  }

  pub fn bridge(&self) -> &H { &self.bridge }

  /// The first open page matching the origin, if any.
  pub async fn first_page(&self) -> Option<HostPage> {
    let pattern = self.pattern.as_ref()?;
    match self.bridge.query_pages(pattern).await {
      Ok(pages) => {
        debug!(count = pages.len(), "queried host pages");
        pages.into_iter().next()
      }
      Err(e) => {
        warn!(error = %e, "host page query failed");
        None
      }
    }
  }

  /// Run the inspection routine in `page`; the first non-empty value, or
  /// `None` on any failure.
  pub async fn extract_from_host(&self, page: &HostPage) -> Option<String> {
    match self.bridge.execute(page, &self.routine).await {
      Ok(value) => value.filter(|v| !v.is_empty()),
      Err(e) => {
        warn!(page = %page.id, error = %e, "inspection routine failed");
        None
      }
    }
  }
}
