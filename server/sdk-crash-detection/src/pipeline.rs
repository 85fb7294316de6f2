//! JSON-lines driver: one crash event per input line, each run through
//! detection. Bad lines are logged and skipped; only I/O errors stop the run.

use std::io::BufRead;

use tracing::warn;

use crate::detection::{SdkCrashDetection, SdkCrashReporter};
use crate::error::DetectionError;
use crate::types::CrashEvent;

/// Counters for one run over an input stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
  /// Lines that parsed as events.
  pub seen: u64,
  pub reported: u64,
  /// Lines that were not valid UTF-8 or not a valid event.
  pub malformed: u64,
}

/// Read `input` to EOF, feeding each non-blank line to `detection`.
pub fn process_lines<B, R>(mut input: B, detection: &SdkCrashDetection<R>) -> Result<RunStats, DetectionError>
where
  B: BufRead,
  R: SdkCrashReporter,
{
  let mut stats = RunStats::default();
  let mut buf = Vec::new();
  let mut n = 0usize;

  loop {
    buf.clear();
    if input.read_until(b'\n', &mut buf)? == 0 {
      break;
    }
    n += 1;

    let line = match std::str::from_utf8(&buf) {
      Ok(l) => l.trim(),
      Err(e) => {
        warn!(line = n, error = %e, "skipping line that is not valid utf-8");
        stats.malformed += 1;
        continue;
      }
    };
    // Skip blank lines.
    if line.is_empty() {
      continue;
    }

    let event: CrashEvent = match serde_json::from_str(line) {
      Ok(v) => v,
      Err(e) => {
        warn!(line = n, error = %e, "skipping malformed event");
        stats.malformed += 1;
        continue;
      }
    };

    stats.seen += 1;
    if detection.detect_sdk_crash(&event).is_some() {
      stats.reported += 1;
    }
  }

  Ok(stats)
}
