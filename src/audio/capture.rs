//! Real audio capture using CPAL (Cross-Platform Audio Library).

use crate::audio::recorder::AudioSource;
use crate::defaults;
use crate::error::{DejaError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only accessed from a single thread at a time
/// through the Mutex wrapper in CpalAudioSource; its methods are called
/// synchronously and never cross thread boundaries unsafely.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone capture at 16kHz mono i16, delivered as fixed-size blocks.
///
/// The cpal callback appends into a shared buffer; `read_block` drains it
/// one block at a time. Tries the i16 stream format first, falling back
/// to f32 with conversion for devices that only expose float.
pub struct CpalAudioSource {
    device: cpal::Device,
    stream: Arc<Mutex<Option<SendableStream>>>,
    buffer: Arc<Mutex<Vec<i16>>>,
    sample_rate: u32,
    block_size: usize,
}

impl CpalAudioSource {
    /// Create a new CPAL audio source.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name. If None, uses the default
    ///   input device.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name {
            let devices = host.input_devices().map_err(|e| DejaError::AudioCapture {
                message: format!("Failed to enumerate devices: {}", e),
            })?;

            devices
                .into_iter()
                .find(|dev| dev.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| DejaError::AudioDeviceNotFound {
                    device: name.to_string(),
                })?
        } else {
            host.default_input_device()
                .ok_or_else(|| DejaError::AudioDeviceNotFound {
                    device: "default".to_string(),
                })?
        };

        Ok(Self {
            device,
            stream: Arc::new(Mutex::new(None)),
            buffer: Arc::new(Mutex::new(Vec::new())),
            sample_rate: defaults::SAMPLE_RATE,
            block_size: defaults::BLOCK_SIZE,
        })
    }

    fn build_stream(&self) -> Result<cpal::Stream> {
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            tracing::warn!(error = %err, "audio stream error");
        };

        // i16 path works with PipeWire/PulseAudio, which convert transparently.
        let buffer = Arc::clone(&self.buffer);
        if let Ok(stream) = self.device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // Fallback for devices that only expose float formats.
        let buffer = Arc::clone(&self.buffer);
        self.device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend(
                            data.iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                        );
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| DejaError::AudioCapture {
                message: format!("Failed to build input stream: {}", e),
            })
    }
}

impl AudioSource for CpalAudioSource {
    fn start(&mut self) -> Result<()> {
        let mut stream_guard = self.stream.lock().map_err(|e| DejaError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        if stream_guard.is_some() {
            // Overlapping device ownership is invalid.
            return Err(DejaError::AudioCapture {
                message: "audio device already started".to_string(),
            });
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| DejaError::AudioCapture {
            message: format!("Failed to start stream: {}", e),
        })?;

        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
        *stream_guard = Some(SendableStream(stream));
        tracing::debug!(sample_rate = self.sample_rate, "audio capture started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut stream_guard = self.stream.lock().map_err(|e| DejaError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        // Dropping the stream releases the device.
        stream_guard.take();
        tracing::debug!("audio capture stopped");
        Ok(())
    }

    fn read_block(&mut self) -> Result<Vec<i16>> {
        let mut buf = self.buffer.lock().map_err(|e| DejaError::AudioCapture {
            message: format!("Failed to lock buffer: {}", e),
        })?;

        if buf.len() < self.block_size {
            return Ok(Vec::new());
        }
        Ok(buf.drain(..self.block_size).collect())
    }
}

/// List all available audio input device names.
pub fn list_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.input_devices().map_err(|e| DejaError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    Ok(devices.filter_map(|d| d.name().ok()).collect())
}
