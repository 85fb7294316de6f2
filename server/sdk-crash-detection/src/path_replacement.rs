//! Anonymizes SDK frame paths before a crash is re-reported.

use regex::Regex;
use serde::Deserialize;

use crate::error::DetectionError;

/// How an SDK frame's path is rewritten in the stripped event.
#[derive(Debug, Clone)]
pub enum PathReplacement {
  /// Collapse every path to a fixed name, e.g. `Sentry.framework`.
  WithName(String),
  /// Keep the path from the earliest matcher hit onwards; empty when nothing matches.
  KeepAfterMatcher(Vec<Regex>),
}

impl PathReplacement {
  pub fn with_name(name: impl Into<String>) -> Self {
    Self::WithName(name.into())
  }

  pub fn keep_after_matcher<I, S>(patterns: I) -> Result<Self, DetectionError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let matchers = patterns
      .into_iter()
      .map(|p| Regex::new(p.as_ref()).map_err(|e| DetectionError::pattern(p.as_ref(), e.to_string())))
      .collect::<Result<Vec<_>, _>>()?;
    if matchers.is_empty() {
      return Err(DetectionError::config(
        "path_replacement.keep_after_matcher",
        "needs at least one matcher",
      ));
    }
    Ok(Self::KeepAfterMatcher(matchers))
  }

  pub fn apply(&self, path: &str) -> String {
    match self {
      Self::WithName(name) => name.clone(),
      Self::KeepAfterMatcher(matchers) => matchers
        .iter()
        .filter_map(|re| re.find(path))
        .min_by_key(|m| m.start())
        .map(|m| path[m.start()..].to_string())
        .unwrap_or_default(),
    }
  }
}

/// Serializable form of [`PathReplacement`], compiled at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawPathReplacement {
  WithName(String),
  KeepAfterMatcher(Vec<String>),
}

impl RawPathReplacement {
  pub fn compile(&self) -> Result<PathReplacement, DetectionError> {
    match self {
      Self::WithName(name) if name.is_empty() => Err(DetectionError::config(
        "path_replacement.with_name",
        "must not be empty",
      )),
      Self::WithName(name) => Ok(PathReplacement::with_name(name.clone())),
      Self::KeepAfterMatcher(patterns) => PathReplacement::keep_after_matcher(patterns),
    }
  }
}
