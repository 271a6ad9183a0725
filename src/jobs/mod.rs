//! Server-side job handles and completion polling.
//!
//! Jobs are created by the server for long-running mutations (uploads,
//! conversions, batch actions). Status moves `waiting -> running ->
//! {success | error}` monotonically and never regresses; a job can also
//! vanish once the server garbage-collects it, which the client observes as
//! a job-not-found fetch outcome.

mod poller;

pub use poller::{wait_for_job, wait_until, PollOptions};

use serde::{Deserialize, Serialize};

use crate::store::Resource;

/// Lifecycle status of a server-side job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
  Waiting,
  Running,
  Success,
  Error,
}

impl JobStatus {
  /// A terminal status admits no further transition.
  pub fn is_terminal(self) -> bool {
    matches!(self, JobStatus::Success | JobStatus::Error)
  }

  pub fn is_pending(self) -> bool {
    !self.is_terminal()
  }
}

/// A server-side job handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
  pub id: String,
  pub status: JobStatus,
  /// Server-reported failure cause, present only for `error` status.
  pub error: Option<String>,
  /// Whether the client may dismiss this job.
  pub dismissible: bool,
}

impl Job {
  pub fn is_terminal(&self) -> bool {
    self.status.is_terminal()
  }

  pub fn is_pending(&self) -> bool {
    self.status.is_pending()
  }

  /// The failure message to raise when the job reached `error` status.
  pub fn failure_message(&self) -> String {
    self
      .error
      .clone()
      .unwrap_or_else(|| format!("job {} failed without a reported cause", self.id))
  }
}

// The background-jobs screen lists jobs like any other remote collection.
impl Resource for Job {
  type Id = String;

  fn id(&self) -> String {
    self.id.clone()
  }

  fn resource_type() -> &'static str {
    "job"
  }
}
