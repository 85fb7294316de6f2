//! SDK crash detection: decides whether an unhandled crash originated inside
//! a vendor SDK and, if so, strips it down to a PII-free report for the SDK's
//! own project.
//!
//! Pure, synchronous classification; the only side effect is the injected
//! reporter call on a positive detection.

pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod glob;
pub mod path_replacement;
pub mod pipeline;
pub mod registry;
pub mod reporter;
pub mod stripper;
pub mod types;
pub mod version;

pub use config::{DetectionSettings, DetectorConfig, RawDetectorConfig};
pub use detection::{Evaluation, SdkCrashDetection, SdkCrashReporter, SkipReason};
pub use error::DetectionError;
pub use pipeline::{process_lines, RunStats};
pub use registry::{DetectorRegistry, SdkFamily};
pub use reporter::JsonLinesReporter;
pub use types::{CrashEvent, ReportedEvent, StrippedEvent};
