//! Fixed-interval polling with a published [`PipelineResult`].
//!
//! [`PollScheduler::spawn`] starts a ticker task that launches one cycle
//! immediately and one per interval after that. Each cycle runs as its own
//! task, so a slow cycle never delays the next tick and cycles may overlap.
//! Results are published through a `watch` channel, but only while the
//! scheduler is alive: once [`PollHandle::shutdown`] has returned (or the
//! handle is dropped) a cycle that is still in flight finishes and its
//! outcome is thrown away. The phase leaves [`PollPhase::Fetching`] only when
//! no cycle is in flight.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
  },
  time::Duration,
};

use earshot_core::view::PipelineResult;
use tokio::{
  sync::watch,
  task::JoinHandle,
  time::{self, MissedTickBehavior},
};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::pipeline::PollSource;

/// Shortest interval the ticker accepts.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
  /// No cycle in flight and the last one to finish succeeded.
  #[default]
  Idle,
  /// A cycle is running. The previous result stays published meanwhile.
  Fetching,
  /// No cycle in flight and the last one to finish failed; its message is in
  /// the result.
  Failed,
}

// ─── Shared state ────────────────────────────────────────────────────────────

/// `alive` is only cleared while holding the `result` channel's lock, and
/// `in_flight` only changes while holding the `phase` channel's lock.
struct Shared {
  alive:     AtomicBool,
  cycles:    AtomicU64,
  in_flight: AtomicUsize,
  result:    watch::Sender<PipelineResult>,
  phase:     watch::Sender<PollPhase>,
}

impl Shared {
  fn is_alive(&self) -> bool { self.alive.load(Ordering::Acquire) }

  fn begin_cycle(&self) {
    self.phase.send_modify(|phase| {
      self.in_flight.fetch_add(1, Ordering::AcqRel);
      *phase = PollPhase::Fetching;
    });
  }

  /// Settle the phase once the last cycle in flight has finished.
  fn end_cycle(&self, failed: bool) {
    self.phase.send_if_modified(|phase| {
      let remaining = self.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
      if remaining > 0 || !self.is_alive() {
        return false;
      }
      *phase = if failed { PollPhase::Failed } else { PollPhase::Idle };
      true
    });
  }

  /// Publish unless the scheduler has been shut down. Returns whether the
  /// result was published.
  fn publish(&self, result: PipelineResult) -> bool {
    self.result.send_if_modified(|slot| {
      if !self.is_alive() {
        return false;
      }
      *slot = result;
      true
    })
  }

  /// Clear the alive flag. Returns whether it was set.
  fn stop(&self) -> bool {
    let mut was_alive = false;
    self.result.send_if_modified(|_| {
      was_alive = self.alive.swap(false, Ordering::AcqRel);
      false
    });
    was_alive
  }
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

pub struct PollScheduler<P> {
  source:   Arc<P>,
  interval: Duration,
}

impl<P: PollSource> PollScheduler<P> {
  /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
  pub fn new(source: Arc<P>, interval: Duration) -> Self {
    Self { source, interval: interval.max(MIN_POLL_INTERVAL) }
  }

  pub fn interval(&self) -> Duration { self.interval }

  /// Start polling. Must be called from within a tokio runtime.
  pub fn spawn(self) -> PollHandle {
    let (result, _) = watch::channel(PipelineResult::loading());
    let (phase, _) = watch::channel(PollPhase::Idle);
    let shared = Arc::new(Shared {
      alive: AtomicBool::new(true),
      cycles: AtomicU64::new(0),
      in_flight: AtomicUsize::new(0),
      result,
      phase,
    });

    info!(interval_secs = self.interval.as_secs(), "starting poll scheduler");
    let ticker = tokio::spawn(tick(self.source, self.interval, shared.clone()));
    PollHandle { shared, ticker }
  }
}

async fn tick<P: PollSource>(source: Arc<P>, interval: Duration, shared: Arc<Shared>) {
  let mut ticks = time::interval(interval);
  ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
  loop {
    ticks.tick().await;
    if !shared.is_alive() {
      break;
    }
    let n = shared.cycles.fetch_add(1, Ordering::Relaxed) + 1;
    tokio::spawn(
      run_cycle(source.clone(), shared.clone()).instrument(info_span!("cycle", n)),
    );
  }
}

async fn run_cycle<P: PollSource>(source: Arc<P>, shared: Arc<Shared>) {
  shared.begin_cycle();
  let outcome = source.poll_once().await;

  // Phase first, so a subscriber woken by the result sees the final phase.
  shared.end_cycle(outcome.is_err());
  let result = match outcome {
    Ok(records) => PipelineResult::ready(records),
    Err(e) => {
      warn!(kind = e.kind(), error = %e, "cycle failed");
      PipelineResult::failed(e.to_string())
    }
  };
  if !shared.publish(result) {
    debug!("scheduler stopped; discarding cycle result");
  }
}

// ─── Handle ──────────────────────────────────────────────────────────────────

/// Owner of a running scheduler. Dropping it stops polling.
pub struct PollHandle {
  shared: Arc<Shared>,
  ticker: JoinHandle<()>,
}

impl PollHandle {
  /// A receiver that is notified on every published result.
  pub fn subscribe(&self) -> watch::Receiver<PipelineResult> { self.shared.result.subscribe() }

  pub fn subscribe_phase(&self) -> watch::Receiver<PollPhase> { self.shared.phase.subscribe() }

  /// The most recently published result; loading until the first cycle
  /// finishes.
  pub fn current(&self) -> PipelineResult { self.shared.result.borrow().clone() }

  pub fn phase(&self) -> PollPhase { *self.shared.phase.borrow() }

  /// Number of cycles started so far.
  pub fn cycles(&self) -> u64 { self.shared.cycles.load(Ordering::Relaxed) }

  pub fn is_alive(&self) -> bool { self.shared.is_alive() }

  /// Stop the ticker and stop publishing. No result is published after
  /// this returns. Idempotent.
  pub fn shutdown(&self) {
    if self.shared.stop() {
      info!("stopping poll scheduler");
    }
    self.ticker.abort();
  }
}

impl Drop for PollHandle {
  fn drop(&mut self) { self.shutdown(); }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;

  use earshot_core::view::ViewRecord;
  use tokio::{sync::Semaphore, time::Instant};

  use super::*;
  use crate::error::CycleError;

  const INTERVAL: Duration = Duration::from_secs(60);

  /// A source whose cycles wait for a permit before finishing.
  struct Gated {
    permits:   Semaphore,
    fail:      bool,
    started:   AtomicUsize,
    completed: AtomicUsize,
  }

  impl Gated {
    fn open() -> Arc<Self> { Self::with_permits(Semaphore::MAX_PERMITS, false) }

    fn closed() -> Arc<Self> { Self::with_permits(0, false) }

    fn failing() -> Arc<Self> { Self::with_permits(Semaphore::MAX_PERMITS, true) }

    fn with_permits(permits: usize, fail: bool) -> Arc<Self> {
      Arc::new(Self {
        permits: Semaphore::new(permits),
        fail,
        started: AtomicUsize::new(0),
        completed: AtomicUsize::new(0),
      })
    }

    fn started(&self) -> usize { self.started.load(Ordering::SeqCst) }

    fn completed(&self) -> usize { self.completed.load(Ordering::SeqCst) }
  }

  impl PollSource for Gated {
    async fn poll_once(&self) -> Result<Vec<ViewRecord>, CycleError> {
      let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
      self.permits.acquire().await.unwrap().forget();
      self.completed.fetch_add(1, Ordering::SeqCst);
      if self.fail {
        return Err(CycleError::NoHostPage);
      }
      Ok(vec![record(&format!("friend-{n}"))])
    }
  }

  fn record(id: &str) -> ViewRecord {
    ViewRecord {
      id:            id.to_owned(),
      name:          id.to_owned(),
      track:         "Unknown Track".into(),
      artist:        "Unknown Artist".into(),
      seconds_ago:   0,
      online:        true,
      context_type:  String::new(),
      context_name:  String::new(),
      context_url:   String::new(),
      track_url:     String::new(),
      artist_url:    String::new(),
      profile_image: None,
    }
  }

  async fn wait_for_completed(source: &Gated, n: usize) {
    while source.completed() < n {
      tokio::task::yield_now().await;
    }
  }

  #[tokio::test(start_paused = true)]
  async fn loading_until_first_cycle() {
    let handle = PollScheduler::new(Gated::closed(), INTERVAL).spawn();
    let current = handle.current();
    assert!(current.is_loading());
    assert!(current.entries().is_empty());
    assert_eq!(current.error(), None);
    assert_eq!(handle.phase(), PollPhase::Idle);
  }

  #[tokio::test(start_paused = true)]
  async fn first_cycle_is_immediate_then_fixed_interval() {
    let source = Gated::open();
    let start = Instant::now();
    let handle = PollScheduler::new(source.clone(), INTERVAL).spawn();
    let mut rx = handle.subscribe();

    rx.changed().await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(rx.borrow_and_update().entries()[0].id, "friend-1");
    assert_eq!(handle.phase(), PollPhase::Idle);

    rx.changed().await.unwrap();
    assert!(start.elapsed() >= INTERVAL);
    assert_eq!(rx.borrow_and_update().entries()[0].id, "friend-2");
    assert_eq!(source.started(), 2);
    assert_eq!(handle.cycles(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn failure_is_published_with_message() {
    let handle = PollScheduler::new(Gated::failing(), INTERVAL).spawn();
    let mut rx = handle.subscribe();

    rx.changed().await.unwrap();
    let result = handle.current();
    assert!(!result.is_loading());
    assert!(result.entries().is_empty());
    assert_eq!(result.error(), Some(CycleError::NoHostPage.to_string().as_str()));
    assert_eq!(handle.phase(), PollPhase::Failed);
  }

  #[tokio::test(start_paused = true)]
  async fn previous_result_stays_while_fetching() {
    let source = Gated::with_permits(1, false);
    let handle = PollScheduler::new(source.clone(), INTERVAL).spawn();
    let mut rx = handle.subscribe();
    rx.changed().await.unwrap();

    let mut phase = handle.subscribe_phase();
    phase.wait_for(|p| *p == PollPhase::Fetching).await.unwrap();
    assert_eq!(source.started(), 2);

    let current = handle.current();
    assert!(!current.is_loading());
    assert_eq!(current.entries()[0].id, "friend-1");
  }

  #[tokio::test(start_paused = true)]
  async fn cycles_overlap_when_one_is_slow() {
    let source = Gated::closed();
    let _handle = PollScheduler::new(source.clone(), INTERVAL).spawn();

    time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(source.started(), 2);
    assert_eq!(source.completed(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn phase_stays_fetching_while_an_overlapping_cycle_runs() {
    let source = Gated::closed();
    let handle = PollScheduler::new(source.clone(), INTERVAL).spawn();
    let mut rx = handle.subscribe();

    time::sleep(INTERVAL + Duration::from_secs(1)).await;
    while source.started() < 2 {
      tokio::task::yield_now().await;
    }

    source.permits.add_permits(1);
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().entries()[0].id, "friend-1");
    assert_eq!(handle.phase(), PollPhase::Fetching);

    source.permits.add_permits(1);
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().entries()[0].id, "friend-2");
    assert_eq!(handle.phase(), PollPhase::Idle);
  }

  #[tokio::test(start_paused = true)]
  async fn shutdown_blocks_later_publication() {
    let handle = PollScheduler::new(Gated::closed(), INTERVAL).spawn();
    handle.shutdown();
    assert!(!handle.shared.publish(PipelineResult::ready(Vec::new())));
    assert!(handle.current().is_loading());
    assert!(!handle.shared.stop());
  }

  #[tokio::test(start_paused = true)]
  async fn late_cycle_after_shutdown_is_discarded() {
    let source = Gated::closed();
    let handle = PollScheduler::new(source.clone(), INTERVAL).spawn();
    let mut phase = handle.subscribe_phase();
    phase.wait_for(|p| *p == PollPhase::Fetching).await.unwrap();

    handle.shutdown();
    assert!(!handle.is_alive());
    source.permits.add_permits(1);
    wait_for_completed(&source, 1).await;

    assert!(handle.current().is_loading());
    assert_eq!(handle.phase(), PollPhase::Fetching);

    time::sleep(INTERVAL * 3).await;
    assert_eq!(source.started(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn dropping_the_handle_stops_polling() {
    let source = Gated::open();
    let handle = PollScheduler::new(source.clone(), INTERVAL).spawn();
    let mut rx = handle.subscribe();
    rx.changed().await.unwrap();
    drop(handle);

    time::sleep(INTERVAL * 3).await;
    assert_eq!(source.started(), 1);
  }

  #[test]
  fn interval_is_clamped() {
    let s = PollScheduler::new(Gated::open(), Duration::ZERO);
    assert_eq!(s.interval(), MIN_POLL_INTERVAL);
  }
}
