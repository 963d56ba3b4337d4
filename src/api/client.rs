//! HTTP client for the verify/transcribe server.

use crate::api::{EnrollResponse, ProcessResponse, SpeechBackend};
use crate::error::{DejaError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// HTTP client posting WAV audio to the verify/transcribe server.
///
/// Both endpoints take a single multipart form field named `audio`.
/// Requests carry a bounded client-side timeout and are never retried: a
/// failed or timed-out upload surfaces as a status message and the user
/// simply speaks again.
pub struct VerifierClient {
    client: reqwest::Client,
    base_url: String,
}

impl VerifierClient {
    /// Create a client for the given base URL (e.g. `http://host:5001`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DejaError::Api {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn audio_form(wav: Vec<u8>, file_name: &'static str) -> Result<reqwest::multipart::Form> {
        let part = reqwest::multipart::Part::bytes(wav)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| DejaError::Api {
                message: format!("Failed to build multipart body: {}", e),
            })?;
        Ok(reqwest::multipart::Form::new().part("audio", part))
    }

    async fn post_audio(
        &self,
        endpoint: &str,
        wav: Vec<u8>,
        file_name: &'static str,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(url = %url, audio_bytes = wav.len(), "uploading audio");

        let form = Self::audio_form(wav, file_name)?;
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "request failed");
                DejaError::from(e)
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "server returned error");
            return Err(DejaError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl SpeechBackend for VerifierClient {
    async fn process(&self, wav: Vec<u8>) -> Result<ProcessResponse> {
        let response = self.post_audio("process", wav, "query.wav").await?;
        let result: ProcessResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse process response");
            DejaError::from(e)
        })?;

        tracing::info!(
            authorized = result.authorized,
            transcript = result.text.as_deref().unwrap_or(""),
            "process complete"
        );
        Ok(result)
    }

    async fn enroll(&self, wav: Vec<u8>) -> Result<EnrollResponse> {
        let response = self.post_audio("enroll", wav, "enroll.wav").await?;
        let result: EnrollResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse enroll response");
            DejaError::from(e)
        })?;

        tracing::info!(message = %result.message, "enrollment complete");
        Ok(result)
    }
}
