//! Audio capture, segmentation and WAV encoding.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod recorder;
pub mod segmenter;
pub mod wav;

pub use recorder::{AudioSource, MockAudioSource};
pub use segmenter::{
    calculate_rms, SegmenterConfig, SegmenterEvent, SegmenterState, Utterance,
    VoiceActivitySegmenter,
};
pub use wav::{encode_utterance, encode_wav, WavFileSource};
