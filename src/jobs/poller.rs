//! Completion polling primitives.
//!
//! Both pollers share one loop shape: fetch, test for a terminal condition,
//! sleep, repeat. [`wait_for_job`] hardcodes the job terminal predicate and
//! the benign "job vanished" short-circuit; [`wait_until`] takes the
//! predicate from the caller and is used to wait for a dependent resource
//! (e.g. a file whose linked job clears).

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};

use super::{Job, JobStatus};

/// Polling parameters.
///
/// `max_attempts: None` preserves the observed unbounded behavior; callers
/// that need a deadline opt in via [`PollOptions::with_max_attempts`] or a
/// cancellation token.
#[derive(Debug, Clone)]
pub struct PollOptions {
  /// Sleep between consecutive fetches.
  pub interval: Duration,
  /// Give up with [`Error::AttemptsExhausted`] after this many non-terminal
  /// fetches. Unbounded when `None`.
  pub max_attempts: Option<u32>,
  /// Cancels the wait with [`Error::Cancelled`], distinct from failure.
  pub cancel: CancellationToken,
}

impl PollOptions {
  pub fn new(interval: Duration) -> Self {
    Self {
      interval,
      max_attempts: None,
      cancel: CancellationToken::new(),
    }
  }

  pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
    self.max_attempts = Some(max_attempts);
    self
  }

  pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }
}

impl Default for PollOptions {
  fn default() -> Self {
    Self::new(Duration::from_secs(2))
  }
}

/// Repeatedly fetch a job until it reaches a terminal state.
///
/// Returns `Ok(None)` when the fetch is classified as job-not-found: the
/// server already garbage-collected a finished job, which is a benign
/// outcome. Any other fetch error propagates. A job in terminal `error`
/// status yields [`Error::JobFailed`] with the job's own message. A job that
/// is already terminal on the first fetch returns without sleeping.
pub async fn wait_for_job<F, Fut>(mut fetch: F, opts: &PollOptions) -> Result<Option<Job>>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<Job>>,
{
  let mut attempts: u32 = 0;
  loop {
    let job = match fetch().await {
      Ok(job) => job,
      Err(err) if err.is_job_not_found() => {
        debug!("job vanished before completion was observed, treating as done");
        return Ok(None);
      }
      Err(err) => return Err(err),
    };

    match job.status {
      JobStatus::Success => return Ok(Some(job)),
      JobStatus::Error => return Err(Error::JobFailed(job.failure_message())),
      JobStatus::Waiting | JobStatus::Running => {}
    }

    attempts += 1;
    if let Some(max) = opts.max_attempts {
      if attempts >= max {
        return Err(Error::AttemptsExhausted(attempts));
      }
    }
    sleep_or_cancel(opts).await?;
  }
}

/// Repeatedly fetch a value until `done` holds for it.
///
/// Same loop shape as [`wait_for_job`] with a caller-supplied terminal
/// predicate. There is no not-found short-circuit here: a dependent resource
/// may legitimately be absent for reasons that are real errors, so every
/// fetch error propagates.
pub async fn wait_until<T, F, Fut, P>(mut fetch: F, done: P, opts: &PollOptions) -> Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T>>,
  P: Fn(&T) -> bool,
{
  let mut attempts: u32 = 0;
  loop {
    let value = fetch().await?;
    if done(&value) {
      return Ok(value);
    }

    attempts += 1;
    if let Some(max) = opts.max_attempts {
      if attempts >= max {
        return Err(Error::AttemptsExhausted(attempts));
      }
    }
    sleep_or_cancel(opts).await?;
  }
}

async fn sleep_or_cancel(opts: &PollOptions) -> Result<()> {
  tokio::select! {
    _ = opts.cancel.cancelled() => Err(Error::Cancelled),
    _ = tokio::time::sleep(opts.interval) => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;
  use tokio::time::Instant;

  fn job(status: JobStatus) -> Job {
    Job {
      id: "j-1".to_string(),
      status,
      error: None,
      dismissible: true,
    }
  }

  /// Fetcher that walks a scripted sequence of results, counting calls.
  fn scripted(
    script: Vec<Result<Job>>,
  ) -> (
    impl FnMut() -> std::future::Ready<Result<Job>>,
    Arc<AtomicUsize>,
  ) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut script = script.into_iter();
    let fetch = move || {
      counter.fetch_add(1, Ordering::SeqCst);
      std::future::ready(script.next().expect("fetcher called past its script"))
    };
    (fetch, calls)
  }

  #[tokio::test(start_paused = true)]
  async fn test_already_terminal_job_returns_without_sleeping() {
    let started = Instant::now();
    let (fetch, calls) = scripted(vec![Ok(job(JobStatus::Success))]);

    let result = wait_for_job(fetch, &PollOptions::default()).await.unwrap();

    assert_eq!(result.unwrap().status, JobStatus::Success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // The paused clock only advances across sleeps; zero sleeps, zero elapsed.
    assert_eq!(started.elapsed(), Duration::ZERO);
  }

  #[tokio::test(start_paused = true)]
  async fn test_pending_job_is_polled_until_success() {
    let (fetch, calls) = scripted(vec![
      Ok(job(JobStatus::Waiting)),
      Ok(job(JobStatus::Running)),
      Ok(job(JobStatus::Success)),
    ]);

    let result = wait_for_job(fetch, &PollOptions::default()).await.unwrap();

    assert!(result.is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_vanished_job_is_benign() {
    let (fetch, _) = scripted(vec![Err(Error::job_not_found("j-1"))]);

    let result = wait_for_job(fetch, &PollOptions::default()).await.unwrap();
    assert!(result.is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_resource_not_found_is_not_short_circuited() {
    let (fetch, _) = scripted(vec![Err(Error::not_found("file is gone"))]);

    let err = wait_for_job(fetch, &PollOptions::default())
      .await
      .unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_job_not_found());
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_job_raises_its_own_message() {
    let mut failed = job(JobStatus::Error);
    failed.error = Some("pyramid generation ran out of disk".to_string());
    let (fetch, _) = scripted(vec![Ok(failed)]);

    let err = wait_for_job(fetch, &PollOptions::default())
      .await
      .unwrap_err();
    match err {
      Error::JobFailed(message) => {
        assert_eq!(message, "pyramid generation ran out of disk");
      }
      other => panic!("expected JobFailed, got {other:?}"),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancellation_is_distinct_from_failure() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let opts = PollOptions::default().with_cancel(cancel);
    let (fetch, _) = scripted(vec![Ok(job(JobStatus::Running))]);

    let err = wait_for_job(fetch, &opts).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
  }

  #[tokio::test(start_paused = true)]
  async fn test_bounded_wait_gives_up() {
    let opts = PollOptions::default().with_max_attempts(2);
    let (fetch, calls) = scripted(vec![
      Ok(job(JobStatus::Waiting)),
      Ok(job(JobStatus::Waiting)),
    ]);

    let err = wait_for_job(fetch, &opts).await.unwrap_err();
    assert!(matches!(err, Error::AttemptsExhausted(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_wait_until_uses_caller_predicate() {
    let values = Arc::new(AtomicUsize::new(0));
    let state = Arc::clone(&values);
    let fetch = move || {
      let n = state.fetch_add(1, Ordering::SeqCst) + 1;
      std::future::ready(Ok(n))
    };

    let n = wait_until(fetch, |n| *n >= 3, &PollOptions::default())
      .await
      .unwrap();
    assert_eq!(n, 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_wait_until_dependent_resource_job_clears() {
    use crate::store::Resource;
    use crate::testutil::doc;

    // A file under conversion keeps its linked-job reference until the
    // server-side work finishes.
    let fetches = Arc::new(AtomicUsize::new(0));
    let state = Arc::clone(&fetches);
    let fetch = move || {
      let n = state.fetch_add(1, Ordering::SeqCst);
      let mut file = doc("doc-1");
      if n < 2 {
        file.job = Some("conversion-7".to_string());
      }
      std::future::ready(Ok(file))
    };

    let file = wait_until(fetch, |f| f.linked_job().is_none(), &PollOptions::default())
      .await
      .unwrap();
    assert!(file.linked_job().is_none());
    assert_eq!(fetches.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_wait_until_propagates_not_found() {
    let fetch = || std::future::ready(Err::<u32, _>(Error::not_found("not converted yet")));

    let err = wait_until(fetch, |_| true, &PollOptions::default())
      .await
      .unwrap_err();
    assert!(err.is_not_found());
  }
}
