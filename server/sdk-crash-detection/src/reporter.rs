//! JSON-lines reporter: writes each dispatched SDK crash as one output line.

use std::io::Write;
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;

use crate::detection::SdkCrashReporter;
use crate::error::DetectionError;
use crate::types::{ReportedEvent, StrippedEvent};

/// One output line (JSON contract: what downstream ingestion reads).
#[derive(Debug, Serialize)]
struct ReportLine<'a> {
  project_id: u64,
  event_id: &'a str,
  reported_at: String,
  event: &'a StrippedEvent,
}

pub struct JsonLinesReporter<W> {
  out: Mutex<W>,
}

impl<W: Write> JsonLinesReporter<W> {
  pub fn new(out: W) -> Self {
    Self { out: Mutex::new(out) }
  }

  pub fn into_inner(self) -> Result<W, DetectionError> {
    self
      .out
      .into_inner()
      .map_err(|_| DetectionError::report("output writer poisoned"))
  }
}

/// Stable id for a stripped payload: blake3 over its JSON, first 32 hex chars.
pub fn event_id(event: &StrippedEvent) -> Result<String, DetectionError> {
  let bytes = serde_json::to_vec(event)?;
  let hex = blake3::hash(&bytes).to_hex();
  Ok(hex[..32].to_string())
}

impl<W: Write> SdkCrashReporter for JsonLinesReporter<W> {
  fn report(&self, event: &StrippedEvent, project_id: u64) -> Result<ReportedEvent, DetectionError> {
    let reported = ReportedEvent {
      event_id: event_id(event)?,
      project_id,
      reported_at: Utc::now(),
    };
    let line = ReportLine {
      project_id,
      event_id: &reported.event_id,
      reported_at: reported.reported_at.to_rfc3339(),
      event,
    };

    let mut out = self
      .out
      .lock()
      .map_err(|_| DetectionError::report("output writer poisoned"))?;
    serde_json::to_writer(&mut *out, &line)?;
    writeln!(out)?;
    out.flush()?;
    Ok(reported)
  }
}
