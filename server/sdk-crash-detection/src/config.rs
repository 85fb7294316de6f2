//! Detector configs (compiled once at startup) and runtime settings.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::DetectionError;
use crate::glob::GlobSet;
use crate::path_replacement::{PathReplacement, RawPathReplacement};
use crate::version::{self, SdkVersion};

/// Env var naming the project that receives stripped SDK crash reports.
pub const PROJECT_ID_ENV: &str = "SDK_CRASH_DETECTION_PROJECT_ID";

/// Runtime settings for the detection pipeline.
#[derive(Debug, Clone, Default)]
pub struct DetectionSettings {
  /// Destination for SDK crash reports. `None` disables dispatch.
  pub destination_project_id: Option<u64>,
}

impl DetectionSettings {
  pub fn from_env() -> Result<Self, DetectionError> {
    Self::from_value(std::env::var(PROJECT_ID_ENV).ok().as_deref())
  }

  /// Parse the raw setting; unset or blank means dispatch is off.
  pub fn from_value(raw: Option<&str>) -> Result<Self, DetectionError> {
    let destination_project_id = match raw.map(str::trim) {
      None | Some("") => None,
      Some(v) => Some(v.parse::<u64>().map_err(|e| {
        DetectionError::config(PROJECT_ID_ENV, &format!("expected a project id: {}", e))
      })?),
    };
    Ok(Self {
      destination_project_id,
    })
  }
}

// ---------------------------------------------------------------------------
// Raw config (deserializable, plain strings)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawDetectorConfig {
  pub sdk_names: Vec<String>,
  pub min_sdk_version: String,
  #[serde(default)]
  pub system_library_paths: Vec<String>,
  #[serde(default)]
  pub sdk_frame_function_matchers: Vec<String>,
  #[serde(default)]
  pub sdk_frame_filename_matchers: Vec<String>,
  #[serde(default)]
  pub sdk_crash_ignore_functions_matchers: Vec<String>,
  pub path_replacement: RawPathReplacement,
}

impl RawDetectorConfig {
  /// Compile patterns and validate invariants. Errors here are fatal at startup.
  pub fn compile(&self) -> Result<DetectorConfig, DetectionError> {
    let sdk_names: BTreeSet<String> = self
      .sdk_names
      .iter()
      .filter(|n| !n.is_empty())
      .cloned()
      .collect();
    if sdk_names.is_empty() {
      return Err(DetectionError::config("sdk_names", "must name at least one sdk"));
    }

    let min_sdk_version: SdkVersion = self.min_sdk_version.parse()?;

    let function_matchers = GlobSet::new(&self.sdk_frame_function_matchers)?;
    let filename_matchers = GlobSet::new(&self.sdk_frame_filename_matchers)?;
    if function_matchers.is_empty() && filename_matchers.is_empty() {
      return Err(DetectionError::config(
        "sdk_frame_function_matchers",
        "function and filename matchers are both empty; config can never match",
      ));
    }

    Ok(DetectorConfig {
      sdk_names,
      min_sdk_version,
      system_library_paths: self
        .system_library_paths
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect(),
      function_matchers,
      filename_matchers,
      ignore_function_matchers: GlobSet::new(&self.sdk_crash_ignore_functions_matchers)?,
      path_replacement: self.path_replacement.compile()?,
    })
  }
}

// ---------------------------------------------------------------------------
// Compiled config
// ---------------------------------------------------------------------------

/// Immutable per-SDK-family detection rules.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
  pub sdk_names: BTreeSet<String>,
  pub min_sdk_version: SdkVersion,
  /// Path prefixes of OS/runtime code. Prefixes starting with `/` must match
  /// at the start of a path; relative ones may occur anywhere in it.
  pub system_library_paths: Vec<String>,
  pub function_matchers: GlobSet,
  pub filename_matchers: GlobSet,
  /// Denylist: a matching function is never SDK code.
  pub ignore_function_matchers: GlobSet,
  pub path_replacement: PathReplacement,
}

impl DetectorConfig {
  pub fn applies_to(&self, sdk_name: &str) -> bool {
    self.sdk_names.contains(sdk_name)
  }

  /// Fails closed on unparsable versions.
  pub fn is_version_eligible(&self, sdk_version: &str) -> bool {
    version::is_eligible(&self.min_sdk_version, sdk_version)
  }
}
