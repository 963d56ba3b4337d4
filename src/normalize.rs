//! Text normalization for similarity comparison.
//!
//! Recognized text is canonicalized into a token set before comparison:
//! lowercased, stripped of punctuation, split on whitespace, with
//! stop-words removed. The stop-word set is configuration, not a constant,
//! because it directly parameterizes similarity sensitivity.

use std::collections::HashSet;

/// Canonicalizes text into token sets for comparison.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stop_words: HashSet<String>,
}

impl TextNormalizer {
    /// Creates a normalizer with the given stop-word set.
    ///
    /// Stop-words are lowercased on the way in so they match tokens
    /// regardless of how they were written in the config.
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Creates a normalizer with the default stop-word set.
    pub fn with_defaults() -> Self {
        Self::new(crate::defaults::STOP_WORDS.iter().copied())
    }

    /// Canonicalizes a string into its token set.
    ///
    /// Lowercase, strip every character outside `[a-z0-9 ]`, split on
    /// whitespace runs, drop empty tokens and stop-words. Duplicates
    /// collapse; order is irrelevant.
    pub fn tokens(&self, text: &str) -> HashSet<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
            .collect();

        cleaned
            .split_whitespace()
            .filter(|t| !t.is_empty() && !self.stop_words.contains(*t))
            .map(str::to_string)
            .collect()
    }
}

/// Jaccard similarity of two token sets: |A ∩ B| / |A ∪ B|.
///
/// Defined as 0.0 when both sets are empty, so blank inputs never match.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f32 / union as f32
}
