//! Structured error types for SDK crash detection.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
  /// Invalid detector config or runtime setting. Only raised at startup.
  #[error("config: {field}: {reason}")]
  Config { field: String, reason: String },

  /// Malformed glob or regex pattern. Only raised at startup.
  #[error("pattern {pattern:?}: {reason}")]
  Pattern { pattern: String, reason: String },

  #[error("strip: {0}")]
  Strip(String),

  #[error("report: {0}")]
  Report(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl DetectionError {
  pub fn config(field: &str, reason: &str) -> Self {
    Self::Config {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
    Self::Pattern {
      pattern: pattern.to_string(),
      reason: reason.into(),
    }
  }

  pub fn strip(msg: impl Into<String>) -> Self {
    Self::Strip(msg.into())
  }

  pub fn report(msg: impl Into<String>) -> Self {
    Self::Report(msg.into())
  }

  /// True for errors that can only come out of startup-time construction.
  pub fn is_configuration(&self) -> bool {
    matches!(self, Self::Config { .. } | Self::Pattern { .. })
  }
}
