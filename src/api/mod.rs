//! Client for the remote voice verify/transcribe server.
//!
//! The server exposes two endpoints: `enroll` registers the owner's voice
//! profile, `process` verifies the speaker and transcribes the audio. The
//! `SpeechBackend` trait allows swapping the real HTTP client for a mock.

pub mod client;

use crate::error::{DejaError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub use client::VerifierClient;

/// Response from the `process` endpoint.
///
/// A non-authorized response carries no usable transcript: unauthorized
/// speech is never compared or recorded.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProcessResponse {
    pub authorized: bool,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from the `enroll` endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EnrollResponse {
    pub message: String,
}

/// Trait for the verify/transcribe backend.
///
/// This trait allows swapping implementations (real server vs mock).
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Verify the speaker and transcribe the given WAV audio.
    async fn process(&self, wav: Vec<u8>) -> Result<ProcessResponse>;

    /// Register the given WAV audio as the owner's voice profile.
    async fn enroll(&self, wav: Vec<u8>) -> Result<EnrollResponse>;
}

/// One scripted outcome for the mock backend.
#[derive(Debug, Clone)]
enum MockOutcome {
    Ok(ProcessResponse),
    Fail(String),
}

/// Mock backend for testing.
///
/// Plays back scripted `process` outcomes in call order; an optional
/// per-call delay simulates transcription latency.
#[derive(Debug, Default)]
pub struct MockBackend {
    outcomes: Mutex<VecDeque<(MockOutcome, Duration)>>,
    enroll_message: String,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            enroll_message: "Enrollment Successful! Voice registered.".to_string(),
        }
    }

    /// Queue an authorized transcription result.
    pub fn with_text(self, text: &str) -> Self {
        self.with_delayed_text(text, Duration::ZERO)
    }

    /// Queue an authorized transcription result delivered after a delay.
    pub fn with_delayed_text(self, text: &str, delay: Duration) -> Self {
        self.push(
            MockOutcome::Ok(ProcessResponse {
                authorized: true,
                text: Some(text.to_string()),
                message: None,
            }),
            delay,
        );
        self
    }

    /// Queue an unauthorized (stranger) verdict.
    pub fn with_unauthorized(self) -> Self {
        self.push(
            MockOutcome::Ok(ProcessResponse {
                authorized: false,
                text: None,
                message: Some("Voice not recognized (Ignored)".to_string()),
            }),
            Duration::ZERO,
        );
        self
    }

    /// Queue a transport failure.
    pub fn with_failure(self, message: &str) -> Self {
        self.push(MockOutcome::Fail(message.to_string()), Duration::ZERO);
        self
    }

    fn push(&self, outcome: MockOutcome, delay: Duration) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back((outcome, delay));
    }
}

#[async_trait]
impl SpeechBackend for MockBackend {
    async fn process(&self, _wav: Vec<u8>) -> Result<ProcessResponse> {
        let next = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some((outcome, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                match outcome {
                    MockOutcome::Ok(resp) => Ok(resp),
                    MockOutcome::Fail(message) => Err(DejaError::Api { message }),
                }
            }
            None => Ok(ProcessResponse {
                authorized: true,
                text: Some(String::new()),
                message: None,
            }),
        }
    }

    async fn enroll(&self, _wav: Vec<u8>) -> Result<EnrollResponse> {
        Ok(EnrollResponse {
            message: self.enroll_message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_plays_outcomes_in_order() {
        let backend = MockBackend::new()
            .with_text("first")
            .with_unauthorized()
            .with_failure("connection refused");

        let r1 = backend.process(Vec::new()).await.unwrap();
        assert!(r1.authorized);
        assert_eq!(r1.text.as_deref(), Some("first"));

        let r2 = backend.process(Vec::new()).await.unwrap();
        assert!(!r2.authorized);
        assert!(r2.text.is_none());

        let r3 = backend.process(Vec::new()).await;
        assert!(r3.is_err());
    }

    #[tokio::test]
    async fn mock_exhausted_returns_blank_transcript() {
        let backend = MockBackend::new();
        let resp = backend.process(Vec::new()).await.unwrap();
        assert!(resp.authorized);
        assert_eq!(resp.text.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn mock_enroll_succeeds() {
        let backend = MockBackend::new();
        let resp = backend.enroll(Vec::new()).await.unwrap();
        assert!(resp.message.contains("Enrollment"));
    }

    #[test]
    fn process_response_deserializes_without_optional_fields() {
        let resp: ProcessResponse =
            serde_json::from_str(r#"{"authorized": false}"#).unwrap();
        assert!(!resp.authorized);
        assert!(resp.text.is_none());
        assert!(resp.message.is_none());
    }

    #[test]
    fn process_response_deserializes_full() {
        let resp: ProcessResponse = serde_json::from_str(
            r#"{"authorized": true, "text": "what is the weather", "message": null}"#,
        )
        .unwrap();
        assert!(resp.authorized);
        assert_eq!(resp.text.as_deref(), Some("what is the weather"));
    }
}
