//! Voice enrollment: record a fixed-duration sample and register it.
//!
//! Enrollment bypasses the segmenter entirely. The owner reads a sentence
//! for a fixed number of seconds; everything captured in that span is
//! uploaded as one WAV, silence included.

use crate::api::SpeechBackend;
use crate::audio::recorder::AudioSource;
use crate::audio::wav::encode_wav;
use crate::error::{DejaError, Result};
use std::thread;
use std::time::Duration;

/// Records `seconds` of audio from `source` and registers it as the
/// owner's voice profile. Returns the server's confirmation message.
pub async fn enroll_voice(
    source: &mut dyn AudioSource,
    backend: &dyn SpeechBackend,
    sample_rate: u32,
    seconds: u64,
) -> Result<String> {
    let samples = record_fixed(source, sample_rate, seconds)?;
    if samples.is_empty() {
        return Err(DejaError::AudioCapture {
            message: "no audio captured during enrollment".to_string(),
        });
    }

    tracing::info!(
        samples = samples.len(),
        seconds,
        "enrollment sample recorded, uploading"
    );
    let wav = encode_wav(&samples, sample_rate)?;
    let response = backend.enroll(wav).await?;
    Ok(response.message)
}

/// Pulls blocks from the source until `seconds` worth of samples have
/// been collected or the source runs dry.
fn record_fixed(source: &mut dyn AudioSource, sample_rate: u32, seconds: u64) -> Result<Vec<i16>> {
    let target = sample_rate as usize * seconds as usize;
    let mut samples = Vec::with_capacity(target);

    source.start()?;
    let result: Result<()> = (|| {
        let mut idle_polls = 0u32;
        while samples.len() < target {
            let block = source.read_block()?;
            if block.is_empty() {
                // A live device just hasn't filled a block yet; a file or
                // mock source that stays empty is exhausted.
                idle_polls += 1;
                if idle_polls > 200 {
                    break;
                }
                thread::sleep(Duration::from_millis(5));
                continue;
            }
            idle_polls = 0;
            samples.extend_from_slice(&block);
        }
        Ok(())
    })();
    let stop_result = source.stop();

    result?;
    stop_result?;
    samples.truncate(target);
    Ok(samples)
}
