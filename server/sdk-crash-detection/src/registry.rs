//! Registry of detector configs, keyed by SDK family and resolved by SDK name.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::config::{DetectorConfig, RawDetectorConfig};
use crate::error::DetectionError;
use crate::path_replacement::RawPathReplacement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkFamily {
  Cocoa,
  ReactNative,
}

impl SdkFamily {
  pub const ALL: [SdkFamily; 2] = [SdkFamily::Cocoa, SdkFamily::ReactNative];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Cocoa => "cocoa",
      Self::ReactNative => "react_native",
    }
  }

  /// Built-in rules for this family.
  pub fn builtin_config(self) -> RawDetectorConfig {
    match self {
      Self::Cocoa => RawDetectorConfig {
        sdk_names: strings(&[
          "sentry.cocoa",
          "sentry.cocoa.capacitor",
          "sentry.cocoa.react-native",
          "sentry.cocoa.dotnet",
          "sentry.cocoa.flutter",
          "sentry.cocoa.kmp",
          "sentry.cocoa.unity",
          "sentry.cocoa.unreal",
        ]),
        // Full image paths, needed for system frame detection, arrived in 8.2.0.
        min_sdk_version: "8.2.0".into(),
        system_library_paths: strings(&["/System/Library/", "/usr/lib/"]),
        sdk_frame_function_matchers: strings(&[
          "*sentrycrash*",
          r"*\[Sentry*",
          "*(Sentry*)*",
          "SentryMX*",
        ]),
        sdk_frame_filename_matchers: strings(&["Sentry**"]),
        // +[SentrySDK crash] is the test hook that crashes on purpose.
        sdk_crash_ignore_functions_matchers: strings(&["**SentrySDK crash**"]),
        path_replacement: RawPathReplacement::WithName("Sentry.framework".into()),
      },
      Self::ReactNative => RawDetectorConfig {
        sdk_names: strings(&["sentry.javascript.react-native"]),
        min_sdk_version: "4.0.0".into(),
        system_library_paths: strings(&["react-native/Libraries/", "react-native-community/"]),
        sdk_frame_function_matchers: vec![],
        sdk_frame_filename_matchers: strings(&["**/sentry-react-native/**"]),
        sdk_crash_ignore_functions_matchers: vec![],
        path_replacement: RawPathReplacement::KeepAfterMatcher(strings(&[
          r"/sentry-react-native/.*",
          r"/@sentry.*",
        ])),
      },
    }
  }
}

impl fmt::Display for SdkFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

/// A family entry in a JSON config file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFamilyConfig {
  pub family: SdkFamily,
  #[serde(flatten)]
  pub config: RawDetectorConfig,
}

/// Read-only after construction; share it freely between workers.
#[derive(Debug, Clone)]
pub struct DetectorRegistry {
  configs: HashMap<SdkFamily, DetectorConfig>,
  by_sdk_name: HashMap<String, SdkFamily>,
}

impl DetectorRegistry {
  /// Build from compiled configs. An SDK name claimed by two families is an error.
  pub fn new(configs: impl IntoIterator<Item = (SdkFamily, DetectorConfig)>) -> Result<Self, DetectionError> {
    let mut by_family = HashMap::new();
    let mut by_sdk_name = HashMap::new();
    for (family, config) in configs {
      for name in &config.sdk_names {
        if let Some(other) = by_sdk_name.insert(name.clone(), family) {
          if other != family {
            return Err(DetectionError::config(
              "sdk_names",
              &format!("{} is claimed by both {} and {}", name, other, family),
            ));
          }
        }
      }
      if by_family.insert(family, config).is_some() {
        return Err(DetectionError::config(
          "family",
          &format!("{} configured more than once", family),
        ));
      }
    }
    Ok(Self {
      configs: by_family,
      by_sdk_name,
    })
  }

  /// Compile all built-in families.
  pub fn builtin() -> Result<Self, DetectionError> {
    Self::new(
      SdkFamily::ALL
        .iter()
        .map(|f| f.builtin_config().compile().map(|c| (*f, c)))
        .collect::<Result<Vec<_>, _>>()?,
    )
  }

  /// Compile a JSON array of family configs.
  pub fn from_json(json: &str) -> Result<Self, DetectionError> {
    let raw: Vec<RawFamilyConfig> = serde_json::from_str(json)?;
    Self::new(
      raw
        .iter()
        .map(|r| r.config.compile().map(|c| (r.family, c)))
        .collect::<Result<Vec<_>, _>>()?,
    )
  }

  pub fn from_file(path: &Path) -> Result<Self, DetectionError> {
    Self::from_json(&std::fs::read_to_string(path)?)
  }

  pub fn family_for(&self, sdk_name: &str) -> Option<SdkFamily> {
    self.by_sdk_name.get(sdk_name).copied()
  }

  pub fn get(&self, family: SdkFamily) -> Option<&DetectorConfig> {
    self.configs.get(&family)
  }

  /// Direct lookup by the event's SDK name.
  pub fn resolve(&self, sdk_name: &str) -> Option<(SdkFamily, &DetectorConfig)> {
    let family = self.family_for(sdk_name)?;
    self.get(family).map(|c| (family, c))
  }

  pub fn len(&self) -> usize {
    self.configs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.configs.is_empty()
  }
}
