//! Streaming utterance segmentation with energy-based VAD and hysteresis.
//!
//! Consumes fixed-size PCM blocks, classifies each as speech or silence by
//! normalized RMS, and emits a complete utterance once sustained silence
//! follows speech. A single quiet block never ends an utterance; the
//! silence counter must exceed the configured patience first, so brief
//! pauses do not fragment a sentence.

use crate::defaults;

/// Configuration for utterance segmentation.
#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    /// Normalized RMS threshold (0.0 to 1.0) above which a block is speech.
    pub voice_threshold: f32,
    /// Consecutive quiet blocks tolerated before flushing an utterance.
    pub silence_patience: u32,
    /// Minimum utterance duration in milliseconds; shorter flushes are
    /// discarded as glitches.
    pub min_utterance_ms: u32,
    /// Sample rate in Hz, used to convert the minimum duration to samples.
    pub sample_rate: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            voice_threshold: defaults::VOICE_THRESHOLD,
            silence_patience: defaults::SILENCE_PATIENCE,
            min_utterance_ms: defaults::MIN_UTTERANCE_MS,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl SegmenterConfig {
    /// Minimum utterance length in samples.
    fn min_samples(&self) -> usize {
        (self.sample_rate as u64 * self.min_utterance_ms as u64 / 1000) as usize
    }
}

/// Segmenter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Not listening; blocks are ignored.
    Idle,
    /// Listening, no speech detected yet.
    Quiet,
    /// Accumulating an utterance.
    Speaking,
    /// Accumulating, counting quiet blocks toward a flush.
    TrailingSilence,
}

/// A complete spoken segment, bounded by detected speech onset and
/// confirmed silence. Sequence numbers reflect completion order.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// PCM samples (16-bit signed), including trailing breath.
    pub samples: Vec<i16>,
    /// Sample rate the samples were captured at.
    pub sample_rate: u32,
    /// Monotonic completion sequence number, starting at 0.
    pub sequence: u64,
}

impl Utterance {
    /// Duration of the utterance in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        (self.samples.len() as u64 * 1000 / self.sample_rate as u64) as u32
    }
}

/// Event produced by feeding one block to the segmenter.
#[derive(Debug)]
pub enum SegmenterEvent {
    /// Nothing notable; keep feeding blocks.
    None,
    /// Speech onset detected; a new utterance buffer was started.
    SpeechStarted,
    /// Sustained silence confirmed; the utterance is complete.
    UtteranceReady(Utterance),
    /// Sustained silence confirmed but the buffer was shorter than the
    /// minimum duration; discarded as a glitch.
    Discarded,
}

/// Streaming voice-activity segmenter.
pub struct VoiceActivitySegmenter {
    config: SegmenterConfig,
    state: SegmenterState,
    buffer: Vec<i16>,
    silence_blocks: u32,
    next_sequence: u64,
}

impl VoiceActivitySegmenter {
    /// Creates a segmenter in the `Idle` state.
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            state: SegmenterState::Idle,
            buffer: Vec::new(),
            silence_blocks: 0,
            next_sequence: 0,
        }
    }

    /// Begins listening. Any partial buffer from a previous session is dropped.
    pub fn start(&mut self) {
        self.buffer.clear();
        self.silence_blocks = 0;
        self.state = SegmenterState::Quiet;
    }

    /// Stops listening and discards any partial utterance.
    pub fn stop(&mut self) {
        self.buffer.clear();
        self.silence_blocks = 0;
        self.state = SegmenterState::Idle;
    }

    /// Returns the current state.
    pub fn state(&self) -> SegmenterState {
        self.state
    }

    /// Feeds one PCM block and returns the resulting event.
    ///
    /// Zero-length blocks are treated as quiet. This method never fails.
    pub fn push_block(&mut self, samples: &[i16]) -> SegmenterEvent {
        if self.state == SegmenterState::Idle {
            return SegmenterEvent::None;
        }

        let rms = calculate_rms(samples);
        let is_loud = rms > self.config.voice_threshold;

        match (self.state, is_loud) {
            (SegmenterState::Quiet, true) => {
                self.buffer.clear();
                self.buffer.extend_from_slice(samples);
                self.silence_blocks = 0;
                self.state = SegmenterState::Speaking;
                SegmenterEvent::SpeechStarted
            }
            (SegmenterState::Quiet, false) => SegmenterEvent::None,
            (SegmenterState::Speaking | SegmenterState::TrailingSilence, true) => {
                self.buffer.extend_from_slice(samples);
                self.silence_blocks = 0;
                self.state = SegmenterState::Speaking;
                SegmenterEvent::None
            }
            (SegmenterState::Speaking | SegmenterState::TrailingSilence, false) => {
                // Keep the quiet block: natural trailing breath belongs
                // to the utterance.
                self.buffer.extend_from_slice(samples);
                self.silence_blocks += 1;
                self.state = SegmenterState::TrailingSilence;

                if self.silence_blocks > self.config.silence_patience {
                    self.flush()
                } else {
                    SegmenterEvent::None
                }
            }
            (SegmenterState::Idle, _) => SegmenterEvent::None,
        }
    }

    fn flush(&mut self) -> SegmenterEvent {
        let samples = std::mem::take(&mut self.buffer);
        self.silence_blocks = 0;
        self.state = SegmenterState::Quiet;

        if samples.len() < self.config.min_samples() {
            return SegmenterEvent::Discarded;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        SegmenterEvent::UtteranceReady(Utterance {
            samples,
            sample_rate: self.config.sample_rate,
            sequence,
        })
    }
}

/// Calculates the normalized Root Mean Square (RMS) of audio samples.
///
/// Returns a value between 0.0 (silence) and 1.0 (maximum amplitude).
/// Empty input yields 0.0.
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}
