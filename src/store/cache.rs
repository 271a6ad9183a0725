//! The materialized view of one paginated remote collection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::bulk::{BulkKind, BulkResult, Severity};
use crate::config::Config;
use crate::error::Result;
use crate::page::PageRequest;
use crate::query::CollectionQuery;
use crate::remote::PageSource;

use super::traits::Resource;

/// Outcome of a forward-pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
  /// A page was fetched and merged; carries the number of newly
  /// materialized items.
  Fetched(usize),
  /// Another fetch held the single-flight latch; nothing was issued.
  InFlight,
  /// The cursor is already on the last page; nothing was issued.
  Exhausted,
}

/// Outcome of a window refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
  Refreshed,
  /// Coalesced against an in-flight fetch; not queued, not retried.
  Skipped,
}

#[derive(Debug, Clone, Copy)]
struct PageMeta {
  page: u32,
  total_pages: u32,
  total_elements: u64,
}

struct State<T: Resource> {
  /// Deduplicated, server-ordered window over the remote collection.
  materialized: Vec<T>,
  last_page: Option<PageMeta>,
  /// Soft references: ids may outlive their entities until the next prune,
  /// but are never dereferenced outside `materialized`.
  selection: HashSet<T::Id>,
  query: CollectionQuery,
  /// Cached copy of the tracked parent entity, refreshed by the synchronizer.
  parent: Option<T>,
  /// Auxiliary counter (e.g. outstanding jobs), refreshed by the synchronizer.
  counter: Option<i64>,
  refreshed_at: Option<DateTime<Utc>>,
}

/// Client-side store over one paginated remote collection.
///
/// Owns the materialized window, the pagination cursor and the selection
/// set. All state mutation happens under one lock; the triggering I/O runs
/// outside it. Forward fetches are single-flight and window refreshes
/// coalesce against them.
pub struct ResourceStore<T: Resource, S: PageSource<T>> {
  source: Arc<S>,
  collection: String,
  page_size: u32,
  parent_id: Option<T::Id>,
  counter_collection: Option<String>,
  /// Single-flight latch, kept outside the state lock so a drop guard can
  /// release it even when the owning future is cancelled mid-fetch.
  loading: Arc<AtomicBool>,
  state: Mutex<State<T>>,
}

/// Releases the single-flight latch on every exit path, cancellation
/// included.
struct LoadingGuard {
  flag: Arc<AtomicBool>,
}

impl LoadingGuard {
  fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| Self {
        flag: Arc::clone(flag),
      })
  }
}

impl Drop for LoadingGuard {
  fn drop(&mut self) {
    self.flag.store(false, Ordering::Release);
  }
}

impl<T: Resource, S: PageSource<T>> ResourceStore<T, S> {
  pub fn new(source: Arc<S>, collection: impl Into<String>, config: &Config) -> Self {
    Self {
      source,
      collection: collection.into(),
      page_size: config.page_size,
      parent_id: None,
      counter_collection: None,
      loading: Arc::new(AtomicBool::new(false)),
      state: Mutex::new(State {
        materialized: Vec::new(),
        last_page: None,
        selection: HashSet::new(),
        query: CollectionQuery::default(),
        parent: None,
        counter: None,
        refreshed_at: None,
      }),
    }
  }

  /// Track a parent entity whose cached copy the synchronizer keeps fresh.
  pub fn with_parent(mut self, id: T::Id) -> Self {
    self.parent_id = Some(id);
    self
  }

  /// Track an auxiliary count of another collection (e.g. outstanding jobs).
  pub fn with_counter(mut self, collection: impl Into<String>) -> Self {
    self.counter_collection = Some(collection.into());
    self
  }

  pub fn with_query(mut self, query: CollectionQuery) -> Self {
    self.state.get_mut().query = query;
    self
  }

  pub fn collection(&self) -> &str {
    &self.collection
  }

  /// Whether a fetch or refresh currently holds the single-flight latch.
  pub fn is_loading(&self) -> bool {
    self.loading.load(Ordering::Acquire)
  }

  /// Fetch the next page and merge it into the window.
  ///
  /// No-ops with [`FetchOutcome::InFlight`] while another fetch is running
  /// and with [`FetchOutcome::Exhausted`] when the cursor is on the last
  /// page; neither case contacts the collaborator. When `replace` is set and
  /// the resolved page index is 1 the window is overwritten; otherwise items
  /// are appended with dedup by id, so a locally mutated copy of an existing
  /// id survives until the next full refresh. Errors leave the window and
  /// selection untouched.
  pub async fn fetch_next(&self, replace: bool) -> Result<FetchOutcome> {
    let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
      debug!(
        collection = %self.collection,
        resource = T::resource_type(),
        "fetch already in flight, skipping"
      );
      return Ok(FetchOutcome::InFlight);
    };

    let request = {
      let state = self.state.lock().await;
      let Some(page) = next_page_index(&state.last_page) else {
        return Ok(FetchOutcome::Exhausted);
      };
      PageRequest {
        collection: self.collection.clone(),
        page,
        size: self.page_size,
        query: state.query.clone(),
      }
    };

    debug!(
      collection = %self.collection,
      page = request.page,
      query = %request.query.description(),
      "fetching page"
    );
    let page = self.source.fetch_page(&request).await?;

    let mut state = self.state.lock().await;
    let added = if replace && page.is_first() {
      let count = page.items.len();
      state.materialized = page.items;
      prune_selection(&mut state);
      count
    } else {
      let mut added = 0;
      for item in page.items {
        let id = item.id();
        if !state.materialized.iter().any(|existing| existing.id() == id) {
          state.materialized.push(item);
          added += 1;
        }
      }
      added
    };
    state.last_page = Some(PageMeta {
      page: page.page,
      total_pages: page.total_pages,
      total_elements: page.total_elements,
    });

    Ok(FetchOutcome::Fetched(added))
  }

  /// Re-fetch the whole materialized window as one page and replace it.
  ///
  /// The request is sized to the current window (default page size when the
  /// window is empty). Selection survives the refresh except for ids no
  /// longer present. While a fetch is in flight the refresh is coalesced:
  /// skipped for this tick, never queued.
  pub async fn refresh_window(&self) -> Result<RefreshOutcome> {
    let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
      debug!(
        collection = %self.collection,
        "refresh coalesced against in-flight fetch"
      );
      return Ok(RefreshOutcome::Skipped);
    };

    let request = {
      let state = self.state.lock().await;
      let window = state.materialized.len() as u32;
      PageRequest {
        collection: self.collection.clone(),
        page: 1,
        size: if window == 0 { self.page_size } else { window },
        query: state.query.clone(),
      }
    };

    let page = self.source.fetch_page(&request).await?;

    let mut state = self.state.lock().await;
    state.materialized = page.items;
    state.last_page = Some(PageMeta {
      page: page.page,
      total_pages: page.total_pages,
      total_elements: page.total_elements,
    });
    prune_selection(&mut state);
    state.refreshed_at = Some(Utc::now());

    Ok(RefreshOutcome::Refreshed)
  }

  /// Apply a server-reported bulk result to the window.
  ///
  /// Delete and move drop succeeded ids from the window; copy leaves the
  /// source entities in place. Succeeded ids always leave the selection so
  /// a stale selection cannot drive a second mutation.
  pub async fn apply_bulk(&self, result: &BulkResult<T::Id>, kind: BulkKind) -> Severity {
    let mut state = self.state.lock().await;
    match kind {
      BulkKind::Delete | BulkKind::Move => {
        state
          .materialized
          .retain(|item| !result.succeeded.contains(&item.id()));
      }
      BulkKind::Copy => {}
    }
    for id in &result.succeeded {
      state.selection.remove(id);
    }

    let severity = result.severity();
    debug!(
      collection = %self.collection,
      succeeded = result.succeeded.len(),
      failed = result.failed.len(),
      ?severity,
      "applied bulk result"
    );
    severity
  }

  /// Reset the pagination cursor so the next `fetch_next` resolves page 1
  /// again. The window is kept until that fetch lands; combined with
  /// `fetch_next(replace: true)` this restarts the listing without flashing
  /// an empty screen.
  pub async fn restart(&self) {
    self.state.lock().await.last_page = None;
  }

  /// Replace the listing query. A changed query invalidates the window:
  /// materialized items, cursor and selection are all reset.
  pub async fn set_query(&self, query: CollectionQuery) {
    let mut state = self.state.lock().await;
    if state.query.cache_hash() == query.cache_hash() {
      return;
    }
    state.query = query;
    state.materialized.clear();
    state.last_page = None;
    state.selection.clear();
  }

  /// The infinite-scroll trigger: true iff `id` is the last materialized
  /// item. The UI calls `fetch_next` exactly when the item for which this
  /// holds becomes visible.
  pub async fn is_last_loaded(&self, id: &T::Id) -> bool {
    let state = self.state.lock().await;
    state
      .materialized
      .last()
      .map(|item| item.id() == *id)
      .unwrap_or(false)
  }

  /// Add a materialized entity to the selection. Ids not currently in the
  /// window are refused, which keeps the selection a subset of ids that
  /// were materialized at some point.
  pub async fn select(&self, id: T::Id) -> bool {
    let mut state = self.state.lock().await;
    if !state.materialized.iter().any(|item| item.id() == id) {
      return false;
    }
    state.selection.insert(id)
  }

  pub async fn deselect(&self, id: &T::Id) {
    self.state.lock().await.selection.remove(id);
  }

  pub async fn clear_selection(&self) {
    self.state.lock().await.selection.clear();
  }

  /// Completion hook for workflows that consumed the selection (dialogs,
  /// batch actions). Clearing here, once, replaces per-workflow observers.
  pub async fn workflow_completed(&self) {
    self.clear_selection().await;
  }

  pub async fn is_selected(&self, id: &T::Id) -> bool {
    self.state.lock().await.selection.contains(id)
  }

  pub async fn selected(&self) -> Vec<T::Id> {
    self.state.lock().await.selection.iter().cloned().collect()
  }

  pub async fn selection_len(&self) -> usize {
    self.state.lock().await.selection.len()
  }

  /// Selection-wide authorization gate: every selected entity still present
  /// in the window must pass `gate`. Stale ids are ignored, but a selection
  /// that resolves to nothing (empty, or all ids stale) is refused rather
  /// than vacuously allowed.
  pub async fn selection_permits<F>(&self, gate: F) -> bool
  where
    F: Fn(&T) -> bool,
  {
    let state = self.state.lock().await;
    if state.selection.is_empty() {
      return false;
    }
    let mut resolved_any = false;
    for item in &state.materialized {
      if state.selection.contains(&item.id()) {
        resolved_any = true;
        if !gate(item) {
          return false;
        }
      }
    }
    resolved_any
  }

  /// Re-fetch the tracked parent entity and replace its cached copy.
  /// No-op when no parent is tracked.
  pub async fn sync_parent(&self) -> Result<()> {
    let Some(id) = &self.parent_id else {
      return Ok(());
    };
    let entity = self.source.fetch_entity(&self.collection, id).await?;
    self.state.lock().await.parent = Some(entity);
    Ok(())
  }

  /// Re-fetch the tracked auxiliary counter. No-op when none is tracked.
  pub async fn sync_counter(&self) -> Result<()> {
    let Some(collection) = &self.counter_collection else {
      return Ok(());
    };
    let count = self.source.fetch_count(collection).await?;
    self.state.lock().await.counter = Some(count);
    Ok(())
  }

  // Snapshot accessors; each clones under the lock.

  pub async fn items(&self) -> Vec<T> {
    self.state.lock().await.materialized.clone()
  }

  pub async fn len(&self) -> usize {
    self.state.lock().await.materialized.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.state.lock().await.materialized.is_empty()
  }

  pub async fn total_elements(&self) -> u64 {
    let state = self.state.lock().await;
    state.last_page.map_or(0, |meta| meta.total_elements)
  }

  /// Whether the remote collection has pages beyond the cursor. True before
  /// the first fetch.
  pub async fn has_more(&self) -> bool {
    let state = self.state.lock().await;
    next_page_index(&state.last_page).is_some()
  }

  pub async fn parent(&self) -> Option<T> {
    self.state.lock().await.parent.clone()
  }

  pub async fn counter(&self) -> Option<i64> {
    self.state.lock().await.counter
  }

  pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
    self.state.lock().await.refreshed_at
  }
}

/// Next 1-based page index for the cursor, or `None` when the collection is
/// exhausted. `>=` instead of `==` also covers the empty collection, where
/// the server reports `page: 1, total_pages: 0`.
fn next_page_index(last_page: &Option<PageMeta>) -> Option<u32> {
  match last_page {
    None => Some(1),
    Some(meta) if meta.page >= meta.total_pages => None,
    Some(meta) => Some(meta.page + 1),
  }
}

fn prune_selection<T: Resource>(state: &mut State<T>) {
  if state.selection.is_empty() {
    return;
  }
  let present: HashSet<T::Id> = state.materialized.iter().map(|item| item.id()).collect();
  state.selection.retain(|id| present.contains(id));
}
