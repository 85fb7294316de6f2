//! SDK version gating: dotted numeric versions compared component-wise.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::DetectionError;

/// Dotted non-negative integer version of arbitrary length, e.g. `8.2.0`.
///
/// Components are kept as digit strings without leading zeros (zero is the
/// empty string), so any number of digits compares numerically.
#[derive(Debug, Clone)]
pub struct SdkVersion(Vec<String>);

impl SdkVersion {
  /// Returns `None` for empty strings or any non-numeric component.
  pub fn parse(s: &str) -> Option<Self> {
    if s.is_empty() {
      return None;
    }
    s.split('.')
      .map(|part| {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
          return None;
        }
        Some(part.trim_start_matches('0').to_string())
      })
      .collect::<Option<Vec<_>>>()
      .map(Self)
  }

  fn component(&self, i: usize) -> &str {
    self.0.get(i).map(String::as_str).unwrap_or("")
  }
}

/// Numeric order of two normalized digit strings: more digits is larger.
fn cmp_component(a: &str, b: &str) -> Ordering {
  a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Shorter versions are padded with trailing zeros, so `8.2 == 8.2.0`.
impl Ord for SdkVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    let len = self.0.len().max(other.0.len());
    (0..len)
      .map(|i| cmp_component(self.component(i), other.component(i)))
      .find(|o| o.is_ne())
      .unwrap_or(Ordering::Equal)
  }
}

impl PartialOrd for SdkVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for SdkVersion {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for SdkVersion {}

impl FromStr for SdkVersion {
  type Err = DetectionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s).ok_or_else(|| {
      DetectionError::config("min_sdk_version", &format!("not a dotted numeric version: {:?}", s))
    })
  }
}

impl fmt::Display for SdkVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<&str> = self.0.iter().map(|c| if c.is_empty() { "0" } else { c.as_str() }).collect();
    f.write_str(&parts.join("."))
  }
}

/// Eligible iff `actual >= min`. An unparsable `actual` is ineligible.
pub fn is_eligible(min: &SdkVersion, actual: &str) -> bool {
  SdkVersion::parse(actual).is_some_and(|actual| actual >= *min)
}
