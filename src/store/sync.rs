//! Background reconciliation timer.
//!
//! One synchronizer per store, owned by the screen/workflow scope that owns
//! the store. Every tick re-fetches the tracked parent entity, the whole
//! materialized window and the auxiliary counter, each best-effort: a
//! failure is logged and the next tick retries, nothing is surfaced to the
//! UI.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::remote::PageSource;

use super::cache::{RefreshOutcome, ResourceStore};
use super::traits::Resource;

/// Recurring reconciliation timer for one [`ResourceStore`].
///
/// `start` is idempotent; `stop` cancels only the timer, never a tick whose
/// work already started. Dropping the synchronizer stops it, tying the
/// refresh lifetime to the owning scope.
pub struct Synchronizer<T: Resource, S: PageSource<T> + 'static> {
  store: Arc<ResourceStore<T, S>>,
  interval: Duration,
  handle: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Resource, S: PageSource<T> + 'static> Synchronizer<T, S> {
  pub fn new(store: Arc<ResourceStore<T, S>>, interval: Duration) -> Self {
    Self {
      store,
      interval,
      handle: Mutex::new(None),
    }
  }

  /// Start the timer. A no-op while already running.
  pub fn start(&self) {
    let mut handle = self.handle.lock().unwrap();
    if handle.as_ref().is_some_and(|h| !h.is_finished()) {
      return;
    }

    let store = Arc::clone(&self.store);
    let interval = self.interval;
    *handle = Some(tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      // The first tick of a tokio interval fires immediately; consume it so
      // the first refresh lands one interval after start.
      ticker.tick().await;
      loop {
        ticker.tick().await;
        // Tick work runs detached so stopping the timer cannot cancel a
        // refresh that is already in flight.
        tokio::spawn(run_tick(Arc::clone(&store)));
      }
    }));
  }

  /// Stop the timer and clear the handle so the synchronizer can be
  /// restarted later.
  pub fn stop(&self) {
    if let Some(handle) = self.handle.lock().unwrap().take() {
      handle.abort();
    }
  }

  pub fn is_running(&self) -> bool {
    self
      .handle
      .lock()
      .unwrap()
      .as_ref()
      .is_some_and(|h| !h.is_finished())
  }
}

impl<T: Resource, S: PageSource<T> + 'static> Drop for Synchronizer<T, S> {
  fn drop(&mut self) {
    self.stop();
  }
}

/// One reconciliation pass. The three steps are independent best-effort
/// operations; failure of one never blocks the others.
async fn run_tick<T: Resource, S: PageSource<T>>(store: Arc<ResourceStore<T, S>>) {
  if let Err(err) = store.sync_parent().await {
    warn!(
      collection = %store.collection(),
      error = %err,
      "background parent refresh failed"
    );
  }

  match store.refresh_window().await {
    Ok(RefreshOutcome::Refreshed) => {}
    Ok(RefreshOutcome::Skipped) => {
      debug!(collection = %store.collection(), "window refresh coalesced");
    }
    Err(err) => {
      warn!(
        collection = %store.collection(),
        error = %err,
        "background window refresh failed"
      );
    }
  }

  if let Err(err) = store.sync_counter().await {
    warn!(
      collection = %store.collection(),
      error = %err,
      "background counter refresh failed"
    );
  }
}
