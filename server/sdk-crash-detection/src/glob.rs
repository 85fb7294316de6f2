//! Anchored wildcard matching for frame function names and filenames.
//!
//! `*` matches any run of characters (including none and including `/`),
//! `\` makes the next character literal. Everything else matches itself,
//! case-sensitively. Patterns always cover the whole candidate.
//!
//! Each pattern is compiled once into an anchored [`Regex`]: literal runs are
//! escaped and every star becomes `.*`.

use std::fmt;

use regex::Regex;
use tracing::trace;

use crate::error::DetectionError;

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Glob {
  pattern: String,
  regex: Regex,
}

impl Glob {
  pub fn new(pattern: &str) -> Result<Self, DetectionError> {
    let regex = Regex::new(&translate(pattern)?).map_err(|e| DetectionError::pattern(pattern, e.to_string()))?;
    Ok(Self {
      pattern: pattern.to_string(),
      regex,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.pattern
  }

  pub fn is_match(&self, candidate: &str) -> bool {
    self.regex.is_match(candidate)
  }
}

/// Glob syntax to regex source: `(?s)^lit.*lit$`.
fn translate(pattern: &str) -> Result<String, DetectionError> {
  let mut out = String::from("(?s)^");
  let mut literal = String::new();
  let mut chars = pattern.chars();
  while let Some(ch) = chars.next() {
    match ch {
      '\\' => {
        let escaped = chars
          .next()
          .ok_or_else(|| DetectionError::pattern(pattern, "dangling escape at end of pattern"))?;
        literal.push(escaped);
      }
      '*' => {
        out.push_str(&regex::escape(&literal));
        literal.clear();
        // Runs of stars behave like a single star.
        if !out.ends_with(".*") {
          out.push_str(".*");
        }
      }
      c => literal.push(c),
    }
  }
  out.push_str(&regex::escape(&literal));
  out.push('$');
  Ok(out)
}

impl fmt::Display for Glob {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A set of globs; matches when any member does. An empty set never matches.
#[derive(Debug, Clone, Default)]
pub struct GlobSet {
  globs: Vec<Glob>,
}

impl GlobSet {
  pub fn new<I, S>(patterns: I) -> Result<Self, DetectionError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let globs = patterns
      .into_iter()
      .map(|p| Glob::new(p.as_ref()))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self { globs })
  }

  pub fn is_empty(&self) -> bool {
    self.globs.is_empty()
  }

  pub fn len(&self) -> usize {
    self.globs.len()
  }

  /// First member matching `candidate`, in configured order.
  pub fn first_match(&self, candidate: &str) -> Option<&Glob> {
    let glob = self.globs.iter().find(|g| g.is_match(candidate))?;
    trace!(candidate = %candidate, pattern = %glob, "glob matched");
    Some(glob)
  }

  pub fn is_match(&self, candidate: &str) -> bool {
    self.first_match(candidate).is_some()
  }

  /// Convenience for optional frame fields: `None` never matches.
  pub fn matches_opt(&self, candidate: Option<&str>) -> bool {
    candidate.is_some_and(|c| self.is_match(c))
  }
}
