//! Core types for SDK crash detection (JSON contracts + stripped payload).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Context key carrying the detection marker on derived SDK crash reports.
pub const SDK_CRASH_CONTEXT: &str = "sdk_crash_detection";

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: Sentry-style event the pipeline hands us)
// ---------------------------------------------------------------------------

/// One captured crash event. Fields we never read are kept opaquely in
/// `extra` so the stripper can prove it drops them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrashEvent {
  #[serde(default)]
  pub event_id: Option<String>,
  #[serde(default)]
  pub platform: Option<String>,
  #[serde(default)]
  pub sdk: SdkInfo,
  #[serde(default)]
  pub exception: Option<ExceptionInterface>,
  #[serde(default)]
  pub contexts: Map<String, Value>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkInfo {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExceptionInterface {
  #[serde(default)]
  pub values: Vec<ExceptionValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExceptionValue {
  #[serde(rename = "type", default)]
  pub ty: Option<String>,
  #[serde(default)]
  pub value: Option<String>,
  #[serde(default)]
  pub mechanism: Option<Mechanism>,
  #[serde(default)]
  pub stacktrace: Option<Stacktrace>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mechanism {
  #[serde(rename = "type", default)]
  pub ty: Option<String>,
  #[serde(default)]
  pub handled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stacktrace {
  #[serde(default)]
  pub frames: Vec<Frame>,
}

/// One stack entry. Index 0 is the outermost frame, the last entry is the
/// crashing frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub function: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filename: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub abs_path: Option<String>,
  /// Binary image the frame belongs to (native platforms).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub package: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lineno: Option<u32>,
  #[serde(default, deserialize_with = "null_as_false")]
  pub in_app: bool,
}

fn null_as_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
  Option::<bool>::deserialize(d).map(Option::unwrap_or_default)
}

impl Frame {
  /// Paths the frame carries, in lookup order. JavaScript frames often only
  /// have a path in `filename`.
  pub fn paths(&self) -> impl Iterator<Item = &str> {
    self
      .abs_path
      .as_deref()
      .into_iter()
      .chain(self.package.as_deref())
      .chain(self.filename.as_deref())
  }
}

impl CrashEvent {
  /// The exception that crashed the process: last entry of `exception.values`.
  pub fn crashing_exception(&self) -> Option<&ExceptionValue> {
    self.exception.as_ref().and_then(|e| e.values.last())
  }

  /// Unhandled only when the mechanism says so explicitly.
  pub fn is_unhandled(&self) -> bool {
    self
      .crashing_exception()
      .and_then(|e| e.mechanism.as_ref())
      .and_then(|m| m.handled)
      == Some(false)
  }

  /// Frames of the crashing exception; empty when there is no stacktrace.
  pub fn frames(&self) -> &[Frame] {
    self
      .crashing_exception()
      .and_then(|e| e.stacktrace.as_ref())
      .map(|s| s.frames.as_slice())
      .unwrap_or(&[])
  }

  /// True when this event is itself a derived SDK crash report.
  pub fn is_sdk_crash_report(&self) -> bool {
    self
      .contexts
      .get(SDK_CRASH_CONTEXT)
      .and_then(|c| c.get("detected"))
      .and_then(Value::as_bool)
      .unwrap_or(false)
  }
}

// ---------------------------------------------------------------------------
// Stripped payload (what gets re-reported to the SDK project)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrippedEvent {
  pub sdk: SdkInfo,
  pub exception: StrippedException,
  pub contexts: StrippedContexts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrippedException {
  pub values: Vec<StrippedExceptionValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrippedExceptionValue {
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub ty: Option<String>,
  pub stacktrace: Stacktrace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrippedContexts {
  pub sdk_crash_detection: SdkCrashContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkCrashContext {
  pub detected: bool,
}

impl StrippedEvent {
  pub fn frames(&self) -> &[Frame] {
    self
      .exception
      .values
      .last()
      .map(|v| v.stacktrace.frames.as_slice())
      .unwrap_or(&[])
  }
}

// ---------------------------------------------------------------------------
// Reporter result
// ---------------------------------------------------------------------------

/// What the reporter hands back after re-ingesting a stripped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedEvent {
  pub event_id: String,
  pub project_id: u64,
  pub reported_at: DateTime<Utc>,
}
