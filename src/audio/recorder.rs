//! Audio source abstraction.
//!
//! The capture loop only ever talks to this trait, so the real microphone
//! (cpal), WAV files and test mocks are interchangeable.

use crate::error::{DejaError, Result};
use std::collections::VecDeque;

/// Trait for audio source devices.
///
/// Sources deliver fixed-size blocks of mono 16-bit PCM in arrival order.
/// An empty block means no data is available (end of file, or nothing
/// captured yet).
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    ///
    /// Starting an already-owned device must fail fast rather than
    /// silently sharing it.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing and release the device.
    fn stop(&mut self) -> Result<()>;

    /// Read the next block of 16-bit PCM samples.
    fn read_block(&mut self) -> Result<Vec<i16>>;
}

/// Mock audio source for testing.
///
/// Plays back a scripted sequence of blocks, then returns empty blocks.
#[derive(Debug, Clone, Default)]
pub struct MockAudioSource {
    is_started: bool,
    blocks: VecDeque<Vec<i16>>,
    should_fail_start: bool,
    error_message: String,
}

impl MockAudioSource {
    /// Create a mock source with no scripted audio.
    pub fn new() -> Self {
        Self {
            is_started: false,
            blocks: VecDeque::new(),
            should_fail_start: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the mock to play back the given blocks in order.
    pub fn with_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Vec<i16>>,
    {
        self.blocks = blocks.into_iter().collect();
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the error message for failures.
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }

    /// Number of scripted blocks not yet read.
    pub fn remaining(&self) -> usize {
        self.blocks.len()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(DejaError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        if self.is_started {
            return Err(DejaError::AudioCapture {
                message: "source already started".to_string(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_block(&mut self) -> Result<Vec<i16>> {
        Ok(self.blocks.pop_front().unwrap_or_default())
    }
}
