//! Default configuration constants for deja.
//!
//! Shared constants used across configuration types so the capture,
//! detection and server settings stay consistent in one place.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and what the verify
/// server expects for speaker comparison.
pub const SAMPLE_RATE: u32 = 16000;

/// Default capture block size in samples.
///
/// 1024 samples at 16kHz is 64ms per block, small enough that the
/// silence counter has useful resolution.
pub const BLOCK_SIZE: usize = 1024;

/// Default voice activity threshold.
///
/// Normalized RMS (0.0 to 1.0); blocks above this are classified as speech.
/// 0.02 is tuned for typical microphone input levels.
pub const VOICE_THRESHOLD: f32 = 0.02;

/// Default number of consecutive quiet blocks before an utterance is flushed.
///
/// 30 blocks of 1024 samples at 16kHz is roughly 1.9 seconds, enough to
/// ride out natural pauses without splitting a sentence in two.
pub const SILENCE_PATIENCE: u32 = 30;

/// Minimum utterance duration in milliseconds.
///
/// Flushes shorter than this are treated as glitches (a cough, a door
/// slam) and discarded instead of being uploaded.
pub const MIN_UTTERANCE_MS: u32 = 500;

/// Default Jaccard similarity threshold for repeat detection (inclusive).
pub const SIMILARITY_THRESHOLD: f32 = 0.45;

/// Default recency window in seconds.
///
/// Inputs older than this are never compared; the next question simply
/// becomes the new anchor.
pub const TIME_WINDOW_SECS: u64 = 45;

/// Default stop-words dropped before similarity comparison.
///
/// "whats" covers the contraction "what's" after punctuation stripping,
/// so paraphrases like "what's the weather" still line up with
/// "what is the weather".
pub const STOP_WORDS: &[&str] = &[
    "is", "the", "a", "an", "to", "of", "you", "me", "please", "can", "what", "whats", "tell",
    "say",
];

/// Default base URL of the verify/transcribe server.
pub const SERVER_URL: &str = "http://127.0.0.1:5001";

/// Default request timeout in seconds for the verify/transcribe server.
///
/// Requests past this are abandoned, not retried; the capture loop keeps
/// running either way.
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Default enrollment recording duration in seconds.
pub const ENROLL_SECS: u64 = 5;

/// Capacity of the utterance hand-off channel between the capture thread
/// and the transcription dispatcher. When full, new utterances are dropped
/// rather than blocking capture.
pub const UTTERANCE_QUEUE_CAPACITY: usize = 8;
