//! Status reporting for the listening pipeline.
//!
//! Everything the UI layer needs to know travels through `StatusReporter`:
//! state transitions, verdict-free outcomes (unauthorized speaker, blank
//! transcript) and failures from the async upload path. Failures terminate
//! here; they never propagate back into the capture loop.

use std::sync::{Arc, Mutex};

/// Observable pipeline states and outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerStatus {
    /// Waiting for speech.
    Listening,
    /// Speech onset detected; accumulating an utterance.
    SpeechDetected,
    /// Utterance complete; upload and transcription in flight.
    Processing,
    /// Speaker verified; transcript accepted.
    Verified { text: String },
    /// Speaker not recognized; the utterance was ignored.
    Unauthorized,
    /// Transcript came back empty; nothing to record.
    BlankTranscript,
    /// Upload or transcription failed; capture continues.
    TransportError { message: String },
    /// The audio device could not be opened or read.
    DeviceError { message: String },
    /// The transcription queue was full; the utterance was dropped.
    UtteranceDropped,
}

/// Trait for reporting pipeline status changes.
pub trait StatusReporter: Send + Sync {
    /// Reports a status change.
    fn report(&self, status: &ListenerStatus);
}

/// Status reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, status: &ListenerStatus) {
        match status {
            ListenerStatus::Listening => eprintln!("deja: listening..."),
            ListenerStatus::SpeechDetected => eprintln!("deja: speech detected"),
            ListenerStatus::Processing => eprintln!("deja: processing..."),
            ListenerStatus::Verified { text } => eprintln!("deja: verified: {}", text),
            ListenerStatus::Unauthorized => eprintln!("deja: ignored (voice not recognized)"),
            ListenerStatus::BlankTranscript => eprintln!("deja: nothing recognized"),
            ListenerStatus::TransportError { message } => {
                eprintln!("deja: server error: {}", message)
            }
            ListenerStatus::DeviceError { message } => {
                eprintln!("deja: audio device error: {}", message)
            }
            ListenerStatus::UtteranceDropped => {
                eprintln!("deja: transcription backlog full, utterance dropped")
            }
        }
    }
}

/// Status reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl StatusReporter for NullReporter {
    fn report(&self, _status: &ListenerStatus) {}
}

/// Status reporter that collects reports for assertions in tests.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    statuses: Arc<Mutex<Vec<ListenerStatus>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn statuses(&self) -> Vec<ListenerStatus> {
        self.statuses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether a given status was ever reported.
    pub fn saw(&self, status: &ListenerStatus) -> bool {
        self.statuses().iter().any(|s| s == status)
    }
}

impl StatusReporter for CollectingReporter {
    fn report(&self, status: &ListenerStatus) {
        self.statuses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(status.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_reporter_records_in_order() {
        let reporter = CollectingReporter::new();
        reporter.report(&ListenerStatus::Listening);
        reporter.report(&ListenerStatus::SpeechDetected);
        reporter.report(&ListenerStatus::Processing);

        assert_eq!(
            reporter.statuses(),
            vec![
                ListenerStatus::Listening,
                ListenerStatus::SpeechDetected,
                ListenerStatus::Processing,
            ]
        );
    }

    #[test]
    fn collecting_reporter_saw() {
        let reporter = CollectingReporter::new();
        reporter.report(&ListenerStatus::Unauthorized);
        assert!(reporter.saw(&ListenerStatus::Unauthorized));
        assert!(!reporter.saw(&ListenerStatus::Listening));
    }

    #[test]
    fn log_reporter_does_not_panic() {
        let reporter = LogReporter;
        reporter.report(&ListenerStatus::Verified {
            text: "hello".to_string(),
        });
        reporter.report(&ListenerStatus::TransportError {
            message: "connection refused".to_string(),
        });
    }
}
