//! Reduce a crash event to the PII-free payload sent to the SDK project.
//!
//! Only the SDK name/version, the crashing exception type and its SDK and
//! system library frames survive. Application frames, the exception message,
//! user, tags, breadcrumbs, request and device data are never copied.
//!
//! Path handling differs by frame kind. SDK frame paths go through the
//! config's [`PathReplacement`](crate::path_replacement::PathReplacement).
//! System library frame paths never do: they are cut to start at the matching
//! system prefix, which leaves absolute OS paths unchanged.

use crate::config::DetectorConfig;
use crate::detector::FrameKind;
use crate::error::DetectionError;
use crate::types::*;

/// Build the stripped payload, already marked as a detected SDK crash.
pub fn strip_event_data(event: &CrashEvent, config: &DetectorConfig) -> Result<StrippedEvent, DetectionError> {
  let exception = event
    .crashing_exception()
    .ok_or_else(|| DetectionError::strip("event has no exception"))?;

  let frames: Vec<Frame> = event
    .frames()
    .iter()
    .filter_map(|frame| match config.classify(frame) {
      kind @ (FrameKind::Sdk | FrameKind::SystemLibrary) => Some(strip_frame(frame, kind, config)),
      FrameKind::Ignored | FrameKind::Other => None,
    })
    .collect();

  if frames.is_empty() {
    return Err(DetectionError::strip("no sdk or system frames left after stripping"));
  }

  Ok(StrippedEvent {
    sdk: SdkInfo {
      name: event.sdk.name.clone(),
      version: event.sdk.version.clone(),
    },
    exception: StrippedException {
      values: vec![StrippedExceptionValue {
        ty: exception.ty.clone(),
        stacktrace: Stacktrace { frames },
      }],
    },
    contexts: StrippedContexts {
      sdk_crash_detection: SdkCrashContext { detected: true },
    },
  })
}

/// SDK frames go through the config's path replacement; system frames keep
/// only the part of the path from the system prefix on. In the SDK's own
/// project its frames are the in-app ones.
fn strip_frame(frame: &Frame, kind: FrameKind, config: &DetectorConfig) -> Frame {
  let rewrite = |path: &str| -> Option<String> {
    let out = match kind {
      FrameKind::Sdk => config.path_replacement.apply(path),
      _ => config.system_library_suffix(path).unwrap_or_default().to_string(),
    };
    (!out.is_empty()).then_some(out)
  };

  Frame {
    function: frame.function.clone(),
    filename: frame.filename.as_deref().and_then(|f| {
      if is_path_like(f) {
        rewrite(f)
      } else {
        Some(f.to_string())
      }
    }),
    abs_path: frame.abs_path.as_deref().and_then(rewrite),
    package: frame.package.as_deref().and_then(rewrite),
    lineno: frame.lineno,
    in_app: kind == FrameKind::Sdk,
  }
}

fn is_path_like(s: &str) -> bool {
  s.contains('/') || s.contains('\\')
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry::SdkFamily;
  use serde_json::Value;

  fn cocoa() -> DetectorConfig {
    SdkFamily::Cocoa.builtin_config().compile().unwrap()
  }

  fn cocoa_event() -> CrashEvent {
    serde_json::from_str(
      r#"{
        "event_id": "4f1c1e1f0d0a4c3b9e8d7c6b5a493827",
        "platform": "cocoa",
        "sdk": {"name": "sentry.cocoa", "version": "8.2.0"},
        "user": {"id": "42", "email": "alice@example.com", "ip_address": "10.0.0.1"},
        "tags": {"customer": "acme"},
        "breadcrumbs": {"values": [{"message": "opened settings"}]},
        "request": {"url": "https://example.com/private"},
        "contexts": {"device": {"model": "iPhone14,2"}, "os": {"name": "iOS"}},
        "exception": {"values": [{
          "type": "EXC_BAD_ACCESS",
          "value": "crash while user alice@example.com was logged in",
          "mechanism": {"type": "mach", "handled": false},
          "stacktrace": {"frames": [
            {"function": "main", "package": "/private/var/containers/Bundle/Application/ABC/MyApp.app/MyApp", "in_app": true},
            {"function": "-[SentryHub captureEvent:]", "package": "/private/var/containers/Bundle/Application/ABC/MyApp.app/Frameworks/Sentry.framework/Sentry", "filename": "SentryHub.m", "lineno": 120},
            {"function": "sentrycrashdump", "abs_path": "/usr/lib/libsentrycrash.dylib", "in_app": false},
            {"function": "objc_msgSend", "package": "/usr/lib/libobjc.A.dylib"}
          ]}
        }]}
      }"#,
    )
    .unwrap()
  }

  #[test]
  fn keeps_only_sdk_and_system_frames() {
    let stripped = strip_event_data(&cocoa_event(), &cocoa()).unwrap();
    let functions: Vec<_> = stripped.frames().iter().map(|f| f.function.as_deref().unwrap()).collect();
    assert_eq!(functions, ["-[SentryHub captureEvent:]", "sentrycrashdump", "objc_msgSend"]);
  }

  #[test]
  fn sdk_paths_are_replaced_and_system_paths_kept() {
    let stripped = strip_event_data(&cocoa_event(), &cocoa()).unwrap();
    let frames = stripped.frames();
    assert_eq!(frames[0].package.as_deref(), Some("Sentry.framework"));
    assert_eq!(frames[0].filename.as_deref(), Some("SentryHub.m"));
    assert_eq!(frames[0].lineno, Some(120));
    assert!(frames[0].in_app);
    assert_eq!(frames[1].abs_path.as_deref(), Some("Sentry.framework"));
    assert_eq!(frames[2].package.as_deref(), Some("/usr/lib/libobjc.A.dylib"));
    assert!(!frames[2].in_app);
  }

  #[test]
  fn marks_detected_and_keeps_sdk_info() {
    let stripped = strip_event_data(&cocoa_event(), &cocoa()).unwrap();
    assert!(stripped.contexts.sdk_crash_detection.detected);
    assert_eq!(stripped.sdk.name, "sentry.cocoa");
    assert_eq!(stripped.sdk.version, "8.2.0");
    assert_eq!(stripped.exception.values[0].ty.as_deref(), Some("EXC_BAD_ACCESS"));
  }

  #[test]
  fn no_personal_data_survives() {
    let stripped = strip_event_data(&cocoa_event(), &cocoa()).unwrap();
    let json = serde_json::to_string(&stripped).unwrap();
    for needle in ["alice", "acme", "10.0.0.1", "iPhone14,2", "opened settings", "example.com", "MyApp", "event_id"] {
      assert!(!json.contains(needle), "{} leaked into {}", needle, json);
    }
  }

  #[test]
  fn payload_has_only_documented_fields() {
    let stripped = strip_event_data(&cocoa_event(), &cocoa()).unwrap();
    let value = serde_json::to_value(&stripped).unwrap();
    let top: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    assert_eq!(top, ["contexts", "exception", "sdk"]);
    assert_eq!(value["contexts"], serde_json::json!({"sdk_crash_detection": {"detected": true}}));
    let exc = value["exception"]["values"][0].as_object().unwrap();
    assert!(exc.keys().all(|k| k == "type" || k == "stacktrace"));
    assert!(value["exception"]["values"][0].get("value").is_none());
    assert!(value["exception"]["values"][0].get("mechanism").is_none());
    for frame in value["exception"]["values"][0]["stacktrace"]["frames"].as_array().unwrap() {
      let allowed = ["function", "filename", "abs_path", "package", "lineno", "in_app"];
      assert!(frame.as_object().unwrap().keys().all(|k| allowed.contains(&k.as_str())));
    }
    assert!(value.get("user").map_or(true, Value::is_null));
  }

  #[test]
  fn react_native_paths_keep_sdk_suffix_only() {
    let config = SdkFamily::ReactNative.builtin_config().compile().unwrap();
    let event: CrashEvent = serde_json::from_str(
      r#"{
        "sdk": {"name": "sentry.javascript.react-native", "version": "5.0.0"},
        "exception": {"values": [{"type": "TypeError", "mechanism": {"handled": false},
          "stacktrace": {"frames": [
            {"function": "onPress", "filename": "/Users/alice/app/src/App.js", "in_app": true},
            {"function": "__callFunction", "filename": "/Users/alice/app/node_modules/react-native/Libraries/BatchedBridge/MessageQueue.js"},
            {"function": "captureException", "filename": "/Users/alice/app/node_modules/sentry-react-native/dist/x.js",
             "abs_path": "/Users/alice/app/node_modules/sentry-react-native/dist/x.js"}
          ]}}]}
      }"#,
    )
    .unwrap();
    let stripped = strip_event_data(&event, &config).unwrap();
    let frames = stripped.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(
      frames[0].filename.as_deref(),
      Some("react-native/Libraries/BatchedBridge/MessageQueue.js")
    );
    assert_eq!(frames[1].filename.as_deref(), Some("/sentry-react-native/dist/x.js"));
    assert_eq!(frames[1].abs_path.as_deref(), Some("/sentry-react-native/dist/x.js"));
    assert!(!serde_json::to_string(&stripped).unwrap().contains("alice"));
  }

  #[test]
  fn system_paths_bypass_path_replacement() {
    let frame = Frame {
      function: Some("__pthread_kill".into()),
      package: Some("/usr/lib/system/libsystem_kernel.dylib".into()),
      ..Frame::default()
    };
    let stripped = strip_frame(&frame, FrameKind::SystemLibrary, &cocoa());
    assert_eq!(stripped.package.as_deref(), Some("/usr/lib/system/libsystem_kernel.dylib"));
    assert_ne!(stripped.package.as_deref(), Some("Sentry.framework"));

    // The @sentry matcher would cut this to "/@sentry-shim.js" on an SDK frame.
    let config = SdkFamily::ReactNative.builtin_config().compile().unwrap();
    let frame = Frame {
      filename: Some("/Users/alice/app/node_modules/react-native/Libraries/Core/@sentry-shim.js".into()),
      ..Frame::default()
    };
    let stripped = strip_frame(&frame, FrameKind::SystemLibrary, &config);
    assert_eq!(
      stripped.filename.as_deref(),
      Some("react-native/Libraries/Core/@sentry-shim.js")
    );
  }

  #[test]
  fn unmatched_sdk_path_is_dropped_not_leaked() {
    let config = SdkFamily::ReactNative.builtin_config().compile().unwrap();
    let frame = Frame {
      function: Some("f".into()),
      filename: Some("/Users/alice/weird/sentry-react-native-fork/x.js".into()),
      abs_path: Some("/Users/alice/secret/x.js".into()),
      ..Frame::default()
    };
    let stripped = strip_frame(&frame, FrameKind::Sdk, &config);
    assert_eq!(stripped.abs_path, None);
  }

  #[test]
  fn event_without_exception_is_strip_error() {
    let event = CrashEvent::default();
    assert!(matches!(strip_event_data(&event, &cocoa()), Err(DetectionError::Strip(_))));
  }
}
