//! The listening pipeline and its supporting pieces.

pub mod orchestrator;
pub mod resequencer;
pub mod sink;
pub mod status;

pub use orchestrator::{Pipeline, PipelineConfig, PipelineHandle};
pub use resequencer::Resequencer;
pub use sink::{CollectorSink, StdoutSink, VerdictSink};
pub use status::{CollectingReporter, ListenerStatus, LogReporter, NullReporter, StatusReporter};
