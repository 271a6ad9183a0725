//! Error taxonomy for the data layer.
//!
//! The RPC collaborator classifies server error responses into a closed set
//! of machine-readable codes; everything the core branches on (the poller's
//! "job vanished" short-circuit in particular) goes through [`ErrorCode`],
//! never through message text. Human-readable messages are collaborator-owned
//! and opaque here.

use thiserror::Error;

/// Closed set of machine-readable error classifications produced by the
/// RPC collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
  /// The requested entity does not exist (or no longer exists).
  ResourceNotFound,
  /// The requested job does not exist. Kept separate from
  /// [`ErrorCode::ResourceNotFound`] because the completion poller treats a
  /// vanished job as benign while a missing resource is an ordinary error.
  JobNotFound,
  /// A create/move/copy collided with an existing name.
  NameConflict,
  /// The server rejected the operation for lack of permission.
  PermissionDenied,
}

impl std::fmt::Display for ErrorCode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let code = match self {
      ErrorCode::ResourceNotFound => "resource not found",
      ErrorCode::JobNotFound => "job not found",
      ErrorCode::NameConflict => "name conflict",
      ErrorCode::PermissionDenied => "permission denied",
    };
    f.write_str(code)
  }
}

/// Errors surfaced by the data layer.
///
/// Partial batch failure is deliberately not an error: it is data, carried by
/// [`crate::bulk::BulkResult`] and classified via [`crate::bulk::Severity`].
#[derive(Debug, Error)]
pub enum Error {
  /// Network or decoding failure. Always propagated for foreground calls.
  #[error("transport failure: {0}")]
  Transport(String),

  /// A classified server error response.
  #[error("{code}: {message}")]
  Api { code: ErrorCode, message: String },

  /// A polled job reached terminal `error` status. Carries the job's own
  /// error message; distinct from a transport failure while fetching it.
  #[error("job failed: {0}")]
  JobFailed(String),

  /// A wait was cancelled through its cancellation token.
  #[error("wait cancelled")]
  Cancelled,

  /// A bounded wait ran out of attempts before reaching a terminal state.
  #[error("no terminal state after {0} attempts")]
  AttemptsExhausted(u32),

  /// Configuration file could not be read or parsed.
  #[error("config error: {0}")]
  Config(String),
}

impl Error {
  pub fn transport(message: impl Into<String>) -> Self {
    Error::Transport(message.into())
  }

  pub fn api(code: ErrorCode, message: impl Into<String>) -> Self {
    Error::Api {
      code,
      message: message.into(),
    }
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::api(ErrorCode::ResourceNotFound, message)
  }

  pub fn job_not_found(id: &str) -> Self {
    Self::api(ErrorCode::JobNotFound, format!("job {} does not exist", id))
  }

  /// The classification code, if this is a classified server error.
  pub fn code(&self) -> Option<ErrorCode> {
    match self {
      Error::Api { code, .. } => Some(*code),
      _ => None,
    }
  }

  /// True only for the job-not-found classification. The poller's benign
  /// short-circuit branches on this, never on [`ErrorCode::ResourceNotFound`].
  pub fn is_job_not_found(&self) -> bool {
    self.code() == Some(ErrorCode::JobNotFound)
  }

  /// True for either not-found classification.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self.code(),
      Some(ErrorCode::ResourceNotFound) | Some(ErrorCode::JobNotFound)
    )
  }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_job_not_found_is_distinct_from_resource_not_found() {
    let job = Error::job_not_found("j-1");
    let resource = Error::not_found("file f-1 does not exist");

    assert!(job.is_job_not_found());
    assert!(job.is_not_found());
    assert!(!resource.is_job_not_found());
    assert!(resource.is_not_found());
  }

  #[test]
  fn test_transport_carries_no_code() {
    let err = Error::transport("connection reset");
    assert_eq!(err.code(), None);
    assert!(!err.is_not_found());
  }

  #[test]
  fn test_display_uses_machine_readable_code() {
    let err = Error::api(ErrorCode::NameConflict, "report.pdf already exists");
    assert_eq!(err.to_string(), "name conflict: report.pdf already exists");
  }
}
