//! deja - notices when you repeat a question
//!
//! Listens for speech, sends each utterance to a voice verify/transcribe
//! server, and remembers the owner's last question so a repeat within the
//! recency window can be flagged instead of silently answered again.

// Error handling discipline: propagate, don't panic.
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod api;
pub mod audio;
pub mod cli;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod detector;
pub mod enroll;
pub mod error;
pub mod normalize;
pub mod pipeline;

// Core traits (source → process → sink)
pub use api::SpeechBackend;
pub use audio::recorder::AudioSource;
pub use pipeline::sink::{CollectorSink, StdoutSink, VerdictSink};
pub use pipeline::status::{ListenerStatus, StatusReporter};

// Pipeline
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineHandle};

// Detection
pub use detector::{DetectorConfig, LoopResult, RedundancyDetector};

// Error handling
pub use error::{DejaError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
