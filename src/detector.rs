//! Repeat-question detection over recognized text.
//!
//! Holds a single-slot memory (the "anchor"): the last accepted input and
//! when it was heard. Each new input is compared against the anchor within
//! a recency window using Jaccard similarity over normalized token sets.
//! A repeat never overwrites the anchor, so a burst of repeats is always
//! reported relative to the first time the question was asked.

use crate::clock::{Clock, SystemClock};
use crate::defaults;
use crate::normalize::{jaccard, TextNormalizer};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Configuration for the redundancy detector.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Jaccard similarity at or above which an input counts as a repeat.
    pub similarity_threshold: f32,
    /// How long the anchor stays comparable. Elapsed time exactly equal
    /// to the window is still compared.
    pub time_window: Duration,
    /// Stop-words removed before comparison.
    pub stop_words: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: defaults::SIMILARITY_THRESHOLD,
            time_window: Duration::from_secs(defaults::TIME_WINDOW_SECS),
            stop_words: defaults::STOP_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Verdict for one processed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopResult {
    /// Fresh observation; this text is now the anchor.
    Recorded { text: String },
    /// Repeat of the anchor within the recency window.
    Repeated {
        current: String,
        previous: String,
        seconds_ago: u64,
    },
}

/// The single remembered prior input.
struct Anchor {
    text: String,
    tokens: HashSet<String>,
    recorded_at: Instant,
}

/// Classifies each recognized input as a repeat of the anchor or a fresh
/// observation. There is exactly one anchor slot; it is overwritten only
/// on `Recorded` verdicts, never on `Repeated` ones, so `recorded_at`
/// is monotonically non-decreasing across `Recorded` events.
pub struct RedundancyDetector<C: Clock = SystemClock> {
    config: DetectorConfig,
    normalizer: TextNormalizer,
    anchor: Option<Anchor>,
    clock: C,
}

impl RedundancyDetector<SystemClock> {
    /// Creates a detector using the system clock.
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RedundancyDetector<C> {
    /// Creates a detector with an injectable clock.
    pub fn with_clock(config: DetectorConfig, clock: C) -> Self {
        let normalizer = TextNormalizer::new(config.stop_words.iter());
        Self {
            config,
            normalizer,
            anchor: None,
            clock,
        }
    }

    /// Classifies one input and updates the anchor accordingly.
    pub fn observe(&mut self, text: &str) -> LoopResult {
        let now = self.clock.now();
        let tokens = self.normalizer.tokens(text);

        if let Some(anchor) = &self.anchor {
            let elapsed = now.duration_since(anchor.recorded_at);
            // Window boundary is inclusive: exactly time_window old still compares.
            if elapsed <= self.config.time_window {
                let similarity = jaccard(&tokens, &anchor.tokens);
                tracing::debug!(
                    similarity,
                    threshold = self.config.similarity_threshold,
                    previous = %anchor.text,
                    "comparing against anchor"
                );
                if similarity >= self.config.similarity_threshold {
                    // Anchor stays put: repeats are measured from the
                    // original question, not the last repeat.
                    return LoopResult::Repeated {
                        current: text.to_string(),
                        previous: anchor.text.clone(),
                        seconds_ago: elapsed.as_secs(),
                    };
                }
            }
        }

        self.anchor = Some(Anchor {
            text: text.to_string(),
            tokens,
            recorded_at: now,
        });
        LoopResult::Recorded {
            text: text.to_string(),
        }
    }

    /// Clears the anchor, as if nothing had been heard yet.
    pub fn reset(&mut self) {
        self.anchor = None;
    }

    /// Text of the current anchor, if any.
    pub fn anchor_text(&self) -> Option<&str> {
        self.anchor.as_ref().map(|a| a.text.as_str())
    }
}
