//! In-memory RPC collaborator for tests and early wiring.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::bulk::{BulkKind, BulkResult};
use crate::error::{Error, Result};
use crate::jobs::Job;
use crate::page::{Page, PageRequest};
use crate::store::Resource;

use super::{BulkSource, JobApi, PageSource};

/// An RPC collaborator backed by in-memory tables.
///
/// Paginates seeded collections the way a server would and supports fault
/// injection (one-shot transport failure, per-id bulk rejection, response
/// delay) so the store's single-flight and coalescing behavior can be
/// exercised deterministically.
pub struct InMemoryRemote<T: Resource> {
  collections: Mutex<HashMap<String, Vec<T>>>,
  jobs: Mutex<HashMap<String, Job>>,
  /// Ids the server reports in the failed partition of bulk operations.
  rejected_ids: Mutex<HashSet<T::Id>>,
  fail_next: AtomicBool,
  page_calls: AtomicUsize,
  delay: StdMutex<Duration>,
}

impl<T: Resource> InMemoryRemote<T> {
  pub fn new() -> Self {
    Self {
      collections: Mutex::new(HashMap::new()),
      jobs: Mutex::new(HashMap::new()),
      rejected_ids: Mutex::new(HashSet::new()),
      fail_next: AtomicBool::new(false),
      page_calls: AtomicUsize::new(0),
      delay: StdMutex::new(Duration::ZERO),
    }
  }

  /// Replace the contents of a collection.
  pub async fn seed(&self, collection: &str, items: Vec<T>) {
    self
      .collections
      .lock()
      .await
      .insert(collection.to_string(), items);
  }

  pub async fn insert_job(&self, job: Job) {
    self.jobs.lock().await.insert(job.id.clone(), job);
  }

  /// Mark ids the next bulk operations will report as failed.
  pub async fn reject_ids(&self, ids: impl IntoIterator<Item = T::Id>) {
    self.rejected_ids.lock().await.extend(ids);
  }

  /// Make the next request fail with a transport error.
  pub fn fail_next_request(&self) {
    self.fail_next.store(true, Ordering::Release);
  }

  /// Delay every response; with a paused test clock this holds requests
  /// in flight for a controlled span.
  pub fn set_delay(&self, delay: Duration) {
    *self.delay.lock().unwrap() = delay;
  }

  /// Number of page fetches issued so far.
  pub fn page_calls(&self) -> usize {
    self.page_calls.load(Ordering::Acquire)
  }

  async fn simulate(&self) -> Result<()> {
    let delay = *self.delay.lock().unwrap();
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    if self.fail_next.swap(false, Ordering::AcqRel) {
      return Err(Error::transport("injected transport failure"));
    }
    Ok(())
  }
}

impl<T: Resource> Default for InMemoryRemote<T> {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl<T: Resource> PageSource<T> for InMemoryRemote<T> {
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>> {
    self.page_calls.fetch_add(1, Ordering::AcqRel);
    self.simulate().await?;

    let collections = self.collections.lock().await;
    let all = collections
      .get(&request.collection)
      .cloned()
      .unwrap_or_default();

    let total_elements = all.len() as u64;
    let size = request.size.max(1);
    let total_pages = total_elements.div_ceil(size as u64) as u32;
    let start = (request.page as usize - 1) * size as usize;
    let items: Vec<T> = all.into_iter().skip(start).take(size as usize).collect();

    Ok(Page {
      items,
      page: request.page,
      size,
      total_pages,
      total_elements,
    })
  }

  async fn fetch_entity(&self, collection: &str, id: &T::Id) -> Result<T> {
    self.simulate().await?;

    let collections = self.collections.lock().await;
    collections
      .get(collection)
      .and_then(|items| items.iter().find(|item| item.id() == *id))
      .cloned()
      .ok_or_else(|| Error::not_found(format!("{} {:?} does not exist", T::resource_type(), id)))
  }

  async fn fetch_count(&self, collection: &str) -> Result<i64> {
    self.simulate().await?;

    let collections = self.collections.lock().await;
    Ok(collections.get(collection).map_or(0, |items| items.len()) as i64)
  }
}

#[async_trait]
impl<T: Resource> BulkSource<T> for InMemoryRemote<T> {
  async fn mutate_bulk(
    &self,
    kind: BulkKind,
    ids: &[T::Id],
    target: Option<&str>,
  ) -> Result<BulkResult<T::Id>> {
    self.simulate().await?;

    let rejected = self.rejected_ids.lock().await;
    let mut succeeded = HashSet::new();
    let mut failed = HashSet::new();
    for id in ids {
      if rejected.contains(id) {
        failed.insert(id.clone());
      } else {
        succeeded.insert(id.clone());
      }
    }
    drop(rejected);

    let mut collections = self.collections.lock().await;
    let mut created = HashSet::new();
    match kind {
      BulkKind::Delete => {
        for items in collections.values_mut() {
          items.retain(|item| !succeeded.contains(&item.id()));
        }
      }
      BulkKind::Move => {
        let mut moved = Vec::new();
        for items in collections.values_mut() {
          let mut kept = Vec::with_capacity(items.len());
          for item in items.drain(..) {
            if succeeded.contains(&item.id()) {
              moved.push(item);
            } else {
              kept.push(item);
            }
          }
          *items = kept;
        }
        if let Some(target) = target {
          collections.entry(target.to_string()).or_default().extend(moved);
        }
      }
      BulkKind::Copy => {
        let mut copies = Vec::new();
        for items in collections.values() {
          for item in items {
            if succeeded.contains(&item.id()) {
              copies.push(item.clone());
            }
          }
        }
        created = copies.iter().map(|item| item.id()).collect();
        if let Some(target) = target {
          collections.entry(target.to_string()).or_default().extend(copies);
        }
      }
    }

    Ok(BulkResult::new(succeeded, failed).with_created(created))
  }
}

#[async_trait]
impl<T: Resource> JobApi for InMemoryRemote<T> {
  async fn fetch_job(&self, id: &str) -> Result<Job> {
    self.simulate().await?;

    self
      .jobs
      .lock()
      .await
      .get(id)
      .cloned()
      .ok_or_else(|| Error::job_not_found(id))
  }

  async fn dismiss_job(&self, id: &str) -> Result<()> {
    self.simulate().await?;

    self
      .jobs
      .lock()
      .await
      .remove(id)
      .map(|_| ())
      .ok_or_else(|| Error::job_not_found(id))
  }

  async fn dismiss_all_jobs(&self) -> Result<BulkResult<String>> {
    self.simulate().await?;

    let mut jobs = self.jobs.lock().await;
    let mut succeeded = HashSet::new();
    let mut failed = HashSet::new();
    jobs.retain(|id, job| {
      if job.dismissible {
        succeeded.insert(id.clone());
        false
      } else {
        failed.insert(id.clone());
        true
      }
    });

    Ok(BulkResult::new(succeeded, failed))
  }
}
