//! Data-layer configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::jobs::PollOptions;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Requested page size for forward pagination.
  pub page_size: u32,
  /// Seconds between background reconciliation ticks.
  pub sync_interval_secs: u64,
  /// Seconds between consecutive job-completion poll fetches.
  pub poll_interval_secs: u64,
  /// Optional bound on poll attempts; unbounded when absent.
  pub poll_max_attempts: Option<u32>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      page_size: 30,
      sync_interval_secs: 5,
      poll_interval_secs: 2,
      poll_max_attempts: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (an error if missing)
  /// 2. ./livelist.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/livelist/config.yaml
  ///
  /// Falls back to defaults when no file is found; the data layer must work
  /// unconfigured.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(Error::Config(format!(
          "config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("livelist.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("livelist").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
      Error::Config(format!("failed to read config file {}: {}", path.display(), e))
    })?;

    serde_yaml::from_str(&contents).map_err(|e| {
      Error::Config(format!(
        "failed to parse config file {}: {}",
        path.display(),
        e
      ))
    })
  }

  pub fn sync_interval(&self) -> Duration {
    Duration::from_secs(self.sync_interval_secs)
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs)
  }

  /// Poll options derived from this configuration.
  pub fn poll_options(&self) -> PollOptions {
    let opts = PollOptions::new(self.poll_interval());
    match self.poll_max_attempts {
      Some(max) => opts.with_max_attempts(max),
      None => opts,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.page_size, 30);
    assert_eq!(config.sync_interval(), Duration::from_secs(5));
    assert_eq!(config.poll_options().max_attempts, None);
  }

  #[test]
  fn test_partial_yaml_keeps_defaults_for_the_rest() {
    let config: Config = serde_yaml::from_str("page_size: 10\npoll_max_attempts: 40\n").unwrap();
    assert_eq!(config.page_size, 10);
    assert_eq!(config.poll_max_attempts, Some(40));
    assert_eq!(config.sync_interval_secs, 5);
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
  }

  #[test]
  fn test_poll_options_carry_bound() {
    let config = Config {
      poll_max_attempts: Some(3),
      ..Config::default()
    };
    assert_eq!(config.poll_options().max_attempts, Some(3));
  }
}
