//! Frame classification: decides whether a crash is attributable to SDK code.

use crate::config::DetectorConfig;
use crate::types::Frame;

/// How a single frame relates to the SDK under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
  /// Function is on the denylist; the crash is never an SDK crash.
  Ignored,
  Sdk,
  /// OS or runtime code; the walk continues past it.
  SystemLibrary,
  /// Application or unrelated third-party code.
  Other,
}

impl DetectorConfig {
  pub fn is_ignored_frame(&self, frame: &Frame) -> bool {
    self
      .ignore_function_matchers
      .matches_opt(frame.function.as_deref())
  }

  /// A frame without function and filename is never an SDK frame.
  pub fn is_sdk_frame(&self, frame: &Frame) -> bool {
    self.function_matchers.matches_opt(frame.function.as_deref())
      || self.filename_matchers.matches_opt(frame.filename.as_deref())
  }

  pub fn is_system_library_frame(&self, frame: &Frame) -> bool {
    frame.paths().any(|path| self.system_library_suffix(path).is_some())
  }

  /// The part of `path` from the system library prefix on, if it has one.
  /// Absolute prefixes must start the path; relative ones may occur anywhere.
  pub fn system_library_suffix<'p>(&self, path: &'p str) -> Option<&'p str> {
    self.system_library_paths.iter().find_map(|prefix| {
      if prefix.starts_with('/') {
        path.starts_with(prefix.as_str()).then_some(path)
      } else {
        path.find(prefix.as_str()).map(|idx| &path[idx..])
      }
    })
  }

  /// Ignore wins over SDK, SDK wins over system library.
  pub fn classify(&self, frame: &Frame) -> FrameKind {
    if self.is_ignored_frame(frame) {
      FrameKind::Ignored
    } else if self.is_sdk_frame(frame) {
      FrameKind::Sdk
    } else if self.is_system_library_frame(frame) {
      FrameKind::SystemLibrary
    } else {
      FrameKind::Other
    }
  }
}

/// Walk from the crashing frame (last) outwards, skipping system library
/// frames. The first frame that is not a system frame decides: SDK means
/// true, anything else (including an ignored function) means false.
pub fn is_sdk_crash(frames: &[Frame], config: &DetectorConfig) -> bool {
  for frame in frames.iter().rev() {
    match config.classify(frame) {
      FrameKind::Ignored | FrameKind::Other => return false,
      FrameKind::Sdk => return true,
      FrameKind::SystemLibrary => continue,
    }
  }
  false
}
