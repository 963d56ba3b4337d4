//! Listening pipeline: capture thread, transcription tasks, detector actor.
//!
//! The capture loop runs on a dedicated thread and drives the segmenter
//! synchronously; it never touches the network. Completed utterances are
//! handed off through a bounded channel to transcription tasks that run
//! concurrently on the tokio runtime. A single detector task owns the
//! `RedundancyDetector` and applies results in utterance completion order
//! (resequenced, so a slow response can never clobber a newer anchor).

use crate::api::{ProcessResponse, SpeechBackend};
use crate::audio::recorder::AudioSource;
use crate::audio::segmenter::{SegmenterConfig, SegmenterEvent, Utterance, VoiceActivitySegmenter};
use crate::audio::wav::encode_utterance;
use crate::defaults;
use crate::detector::{DetectorConfig, RedundancyDetector};
use crate::error::{DejaError, Result};
use crate::pipeline::resequencer::Resequencer;
use crate::pipeline::sink::VerdictSink;
use crate::pipeline::status::{ListenerStatus, StatusReporter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub segmenter: SegmenterConfig,
    pub detector: DetectorConfig,
    /// Capacity of the utterance hand-off queue; utterances beyond it are
    /// dropped so capture never stalls on a transcription backlog.
    pub queue_capacity: usize,
    /// How long the capture loop sleeps when no block is available.
    pub poll_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            detector: DetectorConfig::default(),
            queue_capacity: defaults::UTTERANCE_QUEUE_CAPACITY,
            poll_interval: Duration::from_millis(5),
        }
    }
}

/// Result of one utterance's trip through the async path.
enum Outcome {
    Response(ProcessResponse),
    Failed(DejaError),
    /// Dropped before upload because the queue was full. The sequence
    /// number still has to pass through the resequencer or everything
    /// behind it would stall.
    Dropped,
}

/// The listening pipeline. Construct with [`Pipeline::start`].
pub struct Pipeline;

/// Handle for a running pipeline.
///
/// `shutdown` stops the capture loop, releases the audio device, then
/// waits for in-flight transcriptions to drain.
pub struct PipelineHandle {
    stop_flag: Arc<AtomicBool>,
    capture: Option<thread::JoinHandle<()>>,
    dispatcher: Option<tokio::task::JoinHandle<()>>,
    detector: Option<tokio::task::JoinHandle<()>>,
}

impl Pipeline {
    /// Starts the pipeline. Must be called from within a tokio runtime.
    ///
    /// Fails fast if the audio source cannot be started; the device error
    /// is also reported through `reporter`.
    pub fn start(
        mut source: Box<dyn AudioSource>,
        backend: Arc<dyn SpeechBackend>,
        sink: Box<dyn VerdictSink>,
        reporter: Arc<dyn StatusReporter>,
        config: PipelineConfig,
    ) -> Result<PipelineHandle> {
        if let Err(e) = source.start() {
            reporter.report(&ListenerStatus::DeviceError {
                message: e.to_string(),
            });
            return Err(e);
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let (utterance_tx, utterance_rx) =
            crossbeam_channel::bounded::<Utterance>(config.queue_capacity);
        let (results_tx, results_rx) = mpsc::unbounded_channel::<(u64, Outcome)>();

        let capture = {
            let stop_flag = Arc::clone(&stop_flag);
            let reporter = Arc::clone(&reporter);
            let results_tx = results_tx.clone();
            let segmenter_config = config.segmenter;
            let poll_interval = config.poll_interval;
            thread::spawn(move || {
                capture_loop(
                    source.as_mut(),
                    segmenter_config,
                    &utterance_tx,
                    &results_tx,
                    reporter.as_ref(),
                    &stop_flag,
                    poll_interval,
                );
                if let Err(e) = source.stop() {
                    tracing::warn!(error = %e, "failed to stop audio source");
                }
            })
        };

        let dispatcher = {
            let runtime = tokio::runtime::Handle::current();
            let reporter = Arc::clone(&reporter);
            tokio::task::spawn_blocking(move || {
                while let Ok(utterance) = utterance_rx.recv() {
                    reporter.report(&ListenerStatus::Processing);
                    let backend = Arc::clone(&backend);
                    let results_tx = results_tx.clone();
                    runtime.spawn(async move {
                        let sequence = utterance.sequence;
                        let outcome = match transcribe(backend.as_ref(), utterance).await {
                            Ok(response) => Outcome::Response(response),
                            Err(e) => Outcome::Failed(e),
                        };
                        // Receiver gone means the pipeline already shut down.
                        results_tx.send((sequence, outcome)).ok();
                    });
                }
            })
        };

        let detector_task = {
            let detector_config = config.detector.clone();
            tokio::spawn(detector_actor(
                results_rx,
                detector_config,
                sink,
                reporter,
            ))
        };

        Ok(PipelineHandle {
            stop_flag,
            capture: Some(capture),
            dispatcher: Some(dispatcher),
            detector: Some(detector_task),
        })
    }
}

impl PipelineHandle {
    /// Signals the capture loop to stop without waiting.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Stops capture, releases the device and drains in-flight work.
    pub async fn shutdown(mut self) -> Result<()> {
        self.stop();

        if let Some(handle) = self.capture.take() {
            let joined = tokio::task::spawn_blocking(move || handle.join()).await;
            match joined {
                Ok(Ok(())) => {}
                _ => {
                    return Err(DejaError::Pipeline {
                        message: "capture thread panicked".to_string(),
                    })
                }
            }
        }

        if let Some(task) = self.dispatcher.take() {
            task.await.map_err(|e| DejaError::Pipeline {
                message: format!("dispatcher task failed: {}", e),
            })?;
        }

        if let Some(task) = self.detector.take() {
            task.await.map_err(|e| DejaError::Pipeline {
                message: format!("detector task failed: {}", e),
            })?;
        }

        Ok(())
    }
}

/// Synchronous capture loop. Pulls blocks, drives the segmenter, hands
/// completed utterances off. Network I/O never happens here.
fn capture_loop(
    source: &mut dyn AudioSource,
    segmenter_config: SegmenterConfig,
    utterance_tx: &crossbeam_channel::Sender<Utterance>,
    results_tx: &mpsc::UnboundedSender<(u64, Outcome)>,
    reporter: &dyn StatusReporter,
    stop_flag: &AtomicBool,
    poll_interval: Duration,
) {
    let mut segmenter = VoiceActivitySegmenter::new(segmenter_config);
    segmenter.start();
    reporter.report(&ListenerStatus::Listening);

    while !stop_flag.load(Ordering::SeqCst) {
        let block = match source.read_block() {
            Ok(block) => block,
            Err(e) => {
                // Device errors are not fatal to the process; capture
                // stays off until the session is restarted.
                reporter.report(&ListenerStatus::DeviceError {
                    message: e.to_string(),
                });
                break;
            }
        };

        if block.is_empty() {
            thread::sleep(poll_interval);
            continue;
        }

        match segmenter.push_block(&block) {
            SegmenterEvent::None => {}
            SegmenterEvent::SpeechStarted => {
                reporter.report(&ListenerStatus::SpeechDetected);
            }
            SegmenterEvent::Discarded => {
                // Glitch audio is normal operation, not an error.
                reporter.report(&ListenerStatus::Listening);
            }
            SegmenterEvent::UtteranceReady(utterance) => {
                let sequence = utterance.sequence;
                match utterance_tx.try_send(utterance) {
                    Ok(()) => {}
                    Err(crossbeam_channel::TrySendError::Full(_)) => {
                        reporter.report(&ListenerStatus::UtteranceDropped);
                        // Keep the sequence contiguous for the resequencer.
                        results_tx.send((sequence, Outcome::Dropped)).ok();
                    }
                    Err(crossbeam_channel::TrySendError::Disconnected(_)) => break,
                }
            }
        }
    }
}

/// Encodes an utterance and runs the verify/transcribe round-trip.
async fn transcribe(
    backend: &dyn SpeechBackend,
    utterance: Utterance,
) -> Result<ProcessResponse> {
    let wav = encode_utterance(&utterance)?;
    backend.process(wav).await
}

/// Single-owner actor applying transcription results to the detector in
/// utterance completion order.
async fn detector_actor(
    mut results_rx: mpsc::UnboundedReceiver<(u64, Outcome)>,
    detector_config: DetectorConfig,
    mut sink: Box<dyn VerdictSink>,
    reporter: Arc<dyn StatusReporter>,
) {
    let mut detector = RedundancyDetector::new(detector_config);
    let mut resequencer = Resequencer::new();

    while let Some((sequence, outcome)) = results_rx.recv().await {
        for outcome in resequencer.push(sequence, outcome) {
            apply_outcome(&mut detector, sink.as_mut(), reporter.as_ref(), outcome);
        }
    }
}

fn apply_outcome(
    detector: &mut RedundancyDetector,
    sink: &mut dyn VerdictSink,
    reporter: &dyn StatusReporter,
    outcome: Outcome,
) {
    match outcome {
        Outcome::Dropped => {
            // Already reported by the capture loop.
        }
        Outcome::Failed(e) => {
            // The anchor is left untouched; the user can speak again.
            reporter.report(&ListenerStatus::TransportError {
                message: e.to_string(),
            });
        }
        Outcome::Response(response) => {
            if !response.authorized {
                // Unauthorized speech is never compared or recorded.
                reporter.report(&ListenerStatus::Unauthorized);
            } else {
                let text = response.text.unwrap_or_default();
                if text.trim().is_empty() {
                    reporter.report(&ListenerStatus::BlankTranscript);
                } else {
                    reporter.report(&ListenerStatus::Verified { text: text.clone() });
                    let verdict = detector.observe(&text);
                    if let Err(e) = sink.handle(&verdict) {
                        tracing::warn!(sink = sink.name(), error = %e, "sink failed");
                    }
                }
            }
        }
    }
    reporter.report(&ListenerStatus::Listening);
}
