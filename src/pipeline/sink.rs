//! Pluggable verdict output for the pipeline.
//!
//! Pairs with `AudioSource` for input: whatever consumes `LoopResult`
//! verdicts (terminal output, a UI bridge, a test collector) implements
//! `VerdictSink`.

use crate::detector::LoopResult;
use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Pluggable verdict handler. Called once per accepted transcript, in
/// utterance completion order.
pub trait VerdictSink: Send + 'static {
    /// Handle one verdict.
    fn handle(&mut self, result: &LoopResult) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Sink that prints verdicts to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl VerdictSink for StdoutSink {
    fn handle(&mut self, result: &LoopResult) -> Result<()> {
        match result {
            LoopResult::Recorded { text } => println!("recorded: {}", text),
            LoopResult::Repeated {
                current,
                previous,
                seconds_ago,
            } => println!(
                "repeat: \"{}\" — you asked \"{}\" {}s ago",
                current, previous, seconds_ago
            ),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Sink that collects verdicts for assertions in tests.
#[derive(Debug, Clone, Default)]
pub struct CollectorSink {
    results: Arc<Mutex<Vec<LoopResult>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the collected verdicts; clone before handing the
    /// sink to the pipeline.
    pub fn results(&self) -> Vec<LoopResult> {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl VerdictSink for CollectorSink {
    fn handle(&mut self, result: &LoopResult) -> Result<()> {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(result.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
