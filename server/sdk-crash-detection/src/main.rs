//! Binary entrypoint: read crash events as JSON lines from stdin, write one
//! JSON line to stdout per reported SDK crash.
//!
//! Events that are skipped produce no output line, and neither do lines that
//! are not valid UTF-8 or JSON (those are logged and skipped). Logs go to
//! stderr (`RUST_LOG` controls the level, default `info`).

use std::io;
use std::path::PathBuf;

use sdk_crash_detection::{
  process_lines, DetectionError, DetectionSettings, DetectorRegistry, JsonLinesReporter,
  SdkCrashDetection,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Optional JSON file replacing the built-in detector configs.
const CONFIGS_ENV: &str = "SDK_CRASH_DETECTOR_CONFIGS";

fn load_registry() -> Result<DetectorRegistry, DetectionError> {
  match std::env::var_os(CONFIGS_ENV) {
    Some(path) if !path.is_empty() => {
      let path = PathBuf::from(path);
      info!(path = %path.display(), "loading detector configs");
      DetectorRegistry::from_file(&path)
    }
    _ => DetectorRegistry::builtin(),
  }
}

fn main() {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(io::stderr)
    .init();

  let loaded = load_registry().and_then(|r| DetectionSettings::from_env().map(|s| (r, s)));
  let (registry, settings) = match loaded {
    Ok(v) => v,
    Err(e) => {
      error!(error = %e, "invalid configuration");
      std::process::exit(2);
    }
  };
  info!(
    families = registry.len(),
    destination_project_id = ?settings.destination_project_id,
    "sdk crash detection ready"
  );

  let reporter = JsonLinesReporter::new(io::stdout());
  let detection = SdkCrashDetection::new(registry, reporter, settings);

  match process_lines(io::stdin().lock(), &detection) {
    Ok(stats) => info!(seen = stats.seen, reported = stats.reported, malformed = stats.malformed, "done"),
    Err(e) => {
      error!(error = %e, "read error");
      std::process::exit(1);
    }
  }
}
