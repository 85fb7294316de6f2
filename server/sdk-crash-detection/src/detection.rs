//! Detection orchestrator: gates, classifies, strips and dispatches one event.

use tracing::{debug, info, warn};

use crate::config::DetectionSettings;
use crate::detector;
use crate::error::DetectionError;
use crate::registry::{DetectorRegistry, SdkFamily};
use crate::stripper;
use crate::types::{CrashEvent, ReportedEvent, StrippedEvent};

/// Re-ingests a stripped SDK crash into the destination project.
pub trait SdkCrashReporter {
  fn report(&self, event: &StrippedEvent, project_id: u64) -> Result<ReportedEvent, DetectionError>;
}

/// Why an event was skipped. None of these are failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  UnknownSdk,
  AlreadyDetected,
  SdkVersionTooOld,
  NotUnhandled,
  NoFrames,
  NotSdkCrash,
}

impl SkipReason {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::UnknownSdk => "unknown_sdk",
      Self::AlreadyDetected => "already_detected",
      Self::SdkVersionTooOld => "sdk_version_too_old",
      Self::NotUnhandled => "not_unhandled",
      Self::NoFrames => "no_frames",
      Self::NotSdkCrash => "not_sdk_crash",
    }
  }
}

/// Result of running the gates and the classifier, before dispatch.
#[derive(Debug, Clone)]
pub enum Evaluation {
  Skipped(SkipReason),
  Detected {
    family: SdkFamily,
    stripped: StrippedEvent,
  },
}

/// Stateless across events; share one instance between workers.
pub struct SdkCrashDetection<R> {
  registry: DetectorRegistry,
  reporter: R,
  settings: DetectionSettings,
}

impl<R: SdkCrashReporter> SdkCrashDetection<R> {
  pub fn new(registry: DetectorRegistry, reporter: R, settings: DetectionSettings) -> Self {
    Self {
      registry,
      reporter,
      settings,
    }
  }

  pub fn reporter(&self) -> &R {
    &self.reporter
  }

  pub fn into_reporter(self) -> R {
    self.reporter
  }

  /// Run detection for one event. Returns the reporter's result when an SDK
  /// crash was dispatched, `None` otherwise. Never fails.
  pub fn detect_sdk_crash(&self, event: &CrashEvent) -> Option<ReportedEvent> {
    let (family, stripped) = match self.evaluate(event) {
      Ok(Evaluation::Detected { family, stripped }) => (family, stripped),
      Ok(Evaluation::Skipped(reason)) => {
        debug!(sdk = %event.sdk.name, reason = reason.as_str(), "sdk crash detection skipped");
        return None;
      }
      Err(e) => {
        warn!(sdk = %event.sdk.name, error = %e, "sdk crash detection failed; skipping event");
        return None;
      }
    };

    let Some(project_id) = self.settings.destination_project_id else {
      info!(
        sdk = %event.sdk.name,
        family = %family,
        "sdk crash detected but no destination project configured; not reporting"
      );
      return None;
    };

    match self.reporter.report(&stripped, project_id) {
      Ok(reported) => {
        info!(
          sdk = %event.sdk.name,
          family = %family,
          project_id,
          event_id = %reported.event_id,
          "reported sdk crash"
        );
        Some(reported)
      }
      Err(e) => {
        warn!(sdk = %event.sdk.name, project_id, error = %e, "failed to report sdk crash");
        None
      }
    }
  }

  /// Gates in order, then classification and stripping. No side effects.
  pub fn evaluate(&self, event: &CrashEvent) -> Result<Evaluation, DetectionError> {
    let Some((family, config)) = self.registry.resolve(&event.sdk.name) else {
      return Ok(Evaluation::Skipped(SkipReason::UnknownSdk));
    };
    if event.is_sdk_crash_report() {
      return Ok(Evaluation::Skipped(SkipReason::AlreadyDetected));
    }
    if !config.is_version_eligible(&event.sdk.version) {
      return Ok(Evaluation::Skipped(SkipReason::SdkVersionTooOld));
    }
    if !event.is_unhandled() {
      return Ok(Evaluation::Skipped(SkipReason::NotUnhandled));
    }
    let frames = event.frames();
    if frames.is_empty() {
      return Ok(Evaluation::Skipped(SkipReason::NoFrames));
    }
    if !detector::is_sdk_crash(frames, config) {
      return Ok(Evaluation::Skipped(SkipReason::NotSdkCrash));
    }

    let stripped = stripper::strip_event_data(event, config)?;
    Ok(Evaluation::Detected { family, stripped })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  #[derive(Default)]
  struct RecordingReporter {
    calls: Mutex<Vec<(StrippedEvent, u64)>>,
    fail: bool,
  }

  impl SdkCrashReporter for RecordingReporter {
    fn report(&self, event: &StrippedEvent, project_id: u64) -> Result<ReportedEvent, DetectionError> {
      if self.fail {
        return Err(DetectionError::report("ingest unavailable"));
      }
      self.calls.lock().unwrap().push((event.clone(), project_id));
      Ok(ReportedEvent {
        event_id: "deadbeef".into(),
        project_id,
        reported_at: chrono::Utc::now(),
      })
    }
  }

  fn detection(project_id: Option<u64>) -> SdkCrashDetection<RecordingReporter> {
    SdkCrashDetection::new(
      DetectorRegistry::builtin().unwrap(),
      RecordingReporter::default(),
      DetectionSettings {
        destination_project_id: project_id,
      },
    )
  }

  fn make_event(version: &str, handled: Option<bool>, crashing_function: &str) -> CrashEvent {
    let mechanism = match handled {
      Some(h) => format!(r#","mechanism":{{"type":"signal","handled":{}}}"#, h),
      None => String::new(),
    };
    serde_json::from_str(&format!(
      r#"{{
        "sdk": {{"name": "sentry.cocoa", "version": "{}"}},
        "exception": {{"values": [{{"type": "SIGABRT"{},
          "stacktrace": {{"frames": [
            {{"function": "main", "package": "/var/containers/MyApp.app/MyApp", "in_app": true}},
            {{"function": "{}", "abs_path": "/usr/lib/libsentrycrash.dylib"}}
          ]}}}}]}}
      }}"#,
      version, mechanism, crashing_function
    ))
    .unwrap()
  }

  #[test]
  fn sdk_crash_is_dispatched() {
    let d = detection(Some(1234));
    let reported = d.detect_sdk_crash(&make_event("8.2.0", Some(false), "sentrycrashdump")).unwrap();
    assert_eq!(reported.project_id, 1234);
    let calls = d.reporter().calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.frames()[0].abs_path.as_deref(), Some("Sentry.framework"));
    assert!(calls[0].0.contexts.sdk_crash_detection.detected);
  }

  #[test]
  fn gates_skip_in_order() {
    let d = detection(Some(1));
    let cases = [
      (make_event("8.1.0", Some(false), "sentrycrashdump"), SkipReason::SdkVersionTooOld),
      (make_event("garbage", Some(false), "sentrycrashdump"), SkipReason::SdkVersionTooOld),
      (make_event("8.2.0", Some(true), "sentrycrashdump"), SkipReason::NotUnhandled),
      (make_event("8.2.0", None, "sentrycrashdump"), SkipReason::NotUnhandled),
      (make_event("8.2.0", Some(false), "-[AppDelegate crash]"), SkipReason::NotSdkCrash),
      (make_event("8.2.0", Some(false), "[SentrySDK crash]"), SkipReason::NotSdkCrash),
    ];
    for (event, expected) in cases {
      match d.evaluate(&event).unwrap() {
        Evaluation::Skipped(reason) => assert_eq!(reason, expected),
        Evaluation::Detected { .. } => panic!("expected skip {:?}", expected),
      }
      assert!(d.detect_sdk_crash(&event).is_none());
    }
    assert!(d.reporter().calls.lock().unwrap().is_empty());
  }

  #[test]
  fn unknown_sdk_is_skipped() {
    let d = detection(Some(1));
    let mut event = make_event("8.2.0", Some(false), "sentrycrashdump");
    event.sdk.name = "sentry.java.android".into();
    assert!(matches!(d.evaluate(&event).unwrap(), Evaluation::Skipped(SkipReason::UnknownSdk)));
  }

  #[test]
  fn empty_frames_are_skipped() {
    let d = detection(Some(1));
    let event: CrashEvent = serde_json::from_str(
      r#"{"sdk":{"name":"sentry.cocoa","version":"8.2.0"},
          "exception":{"values":[{"type":"SIGABRT","mechanism":{"handled":false},"stacktrace":{"frames":[]}}]}}"#,
    )
    .unwrap();
    assert!(matches!(d.evaluate(&event).unwrap(), Evaluation::Skipped(SkipReason::NoFrames)));
  }

  #[test]
  fn already_detected_event_is_never_redispatched() {
    let d = detection(Some(1));
    let mut event = make_event("8.2.0", Some(false), "sentrycrashdump");
    event
      .contexts
      .insert("sdk_crash_detection".into(), serde_json::json!({"detected": true}));
    assert!(d.detect_sdk_crash(&event).is_none());
    assert!(d.detect_sdk_crash(&event).is_none());
    assert!(d.reporter().calls.lock().unwrap().is_empty());
  }

  #[test]
  fn missing_destination_skips_dispatch() {
    let d = detection(None);
    let event = make_event("8.2.0", Some(false), "sentrycrashdump");
    assert!(matches!(d.evaluate(&event).unwrap(), Evaluation::Detected { .. }));
    assert!(d.detect_sdk_crash(&event).is_none());
    assert!(d.reporter().calls.lock().unwrap().is_empty());
  }

  #[test]
  fn reporter_failure_is_swallowed() {
    let d = SdkCrashDetection::new(
      DetectorRegistry::builtin().unwrap(),
      RecordingReporter {
        fail: true,
        ..Default::default()
      },
      DetectionSettings {
        destination_project_id: Some(1),
      },
    );
    assert!(d.detect_sdk_crash(&make_event("8.2.0", Some(false), "sentrycrashdump")).is_none());
  }
}
