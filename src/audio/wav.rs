//! WAV encoding for utterance upload, and a WAV-backed audio source.
//!
//! Encoded buffers use the canonical 44-byte RIFF/WAVE header (PCM, mono,
//! 16-bit, little-endian) that any standard reader can decode. The
//! `WavFileSource` goes the other way: it adapts a WAV file (any rate,
//! mono or stereo) into the fixed-rate block stream the segmenter expects,
//! which is how file and pipe mode feed the pipeline.

use crate::audio::recorder::AudioSource;
use crate::audio::segmenter::Utterance;
use crate::defaults;
use crate::error::{DejaError, Result};
use std::io::{Cursor, Read};

/// Size in bytes of the canonical PCM WAV header.
pub const WAV_HEADER_LEN: usize = 44;

/// Encodes raw samples into a complete in-memory WAV file.
///
/// Header layout: "RIFF", total size minus 8, "WAVEfmt ", format chunk
/// size 16, PCM format 1, 1 channel, the sample rate, byte rate
/// (rate × 2), block align 2, 16 bits per sample, "data", data size,
/// then the samples in little-endian order.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2));
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| DejaError::WavEncode {
                message: format!("Failed to create WAV writer: {}", e),
            })?;
        for &sample in samples {
            writer.write_sample(sample).map_err(|e| DejaError::WavEncode {
                message: format!("Failed to write sample: {}", e),
            })?;
        }
        writer.finalize().map_err(|e| DejaError::WavEncode {
            message: format!("Failed to finalize WAV: {}", e),
        })?;
    }
    Ok(cursor.into_inner())
}

/// Encodes a complete utterance into an uploadable WAV buffer.
pub fn encode_utterance(utterance: &Utterance) -> Result<Vec<u8>> {
    encode_wav(&utterance.samples, utterance.sample_rate)
}

/// Audio source that reads from WAV file data.
/// Supports arbitrary sample rates and channels, resampling to the target rate.
pub struct WavFileSource {
    samples: Vec<i16>,
    position: usize,
    block_size: usize,
}

impl WavFileSource {
    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader = hound::WavReader::new(reader).map_err(|e| DejaError::AudioCapture {
            message: format!("Failed to parse WAV file: {}", e),
        })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DejaError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        // Downmix stereo to mono
        let mono_samples = if source_channels == 2 {
            raw_samples
                .chunks_exact(2)
                .map(|chunk| {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    ((left + right) / 2) as i16
                })
                .collect()
        } else {
            raw_samples
        };

        let samples = if source_rate != defaults::SAMPLE_RATE {
            resample(&mono_samples, source_rate, defaults::SAMPLE_RATE)
        } else {
            mono_samples
        };

        Ok(Self {
            samples,
            position: 0,
            block_size: defaults::BLOCK_SIZE,
        })
    }

    /// Create from a file on disk.
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_reader(Box::new(Cursor::new(data)))
    }

    /// Create from stdin.
    pub fn from_stdin() -> Result<Self> {
        // Read everything into memory first (StdinLock is not Send)
        let mut buffer = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .map_err(|e| DejaError::AudioCapture {
                message: format!("Failed to read from stdin: {}", e),
            })?;
        Self::from_reader(Box::new(Cursor::new(buffer)))
    }

    /// Append `blocks` blocks of silence to the end of the audio.
    ///
    /// A file that ends mid-speech would otherwise leave the final
    /// utterance unflushed; padding lets the segmenter close it out.
    pub fn with_trailing_silence(mut self, blocks: usize) -> Self {
        self.samples.extend(vec![0i16; blocks * self.block_size]);
        self
    }

    /// Consume the source and return all samples as a single buffer.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

impl AudioSource for WavFileSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_block(&mut self) -> Result<Vec<i16>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }

        let end = std::cmp::min(self.position + self.block_size, self.samples.len());
        let block = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(block)
    }
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
