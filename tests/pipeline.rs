//! End-to-end pipeline tests with scripted audio and a mock backend.

use deja::api::MockBackend;
use deja::audio::recorder::MockAudioSource;
use deja::audio::segmenter::SegmenterConfig;
use deja::detector::{DetectorConfig, LoopResult};
use deja::pipeline::status::{CollectingReporter, ListenerStatus};
use deja::pipeline::{CollectorSink, Pipeline, PipelineConfig};
use std::sync::Arc;
use std::time::Duration;

const BLOCK: usize = 1024;

fn loud_block() -> Vec<i16> {
    vec![8000i16; BLOCK]
}

fn quiet_block() -> Vec<i16> {
    vec![0i16; BLOCK]
}

/// One spoken utterance: speech followed by enough silence to flush.
fn utterance_blocks() -> Vec<Vec<i16>> {
    let mut blocks = vec![loud_block(), loud_block()];
    blocks.extend([quiet_block(), quiet_block(), quiet_block()]);
    blocks
}

/// Short patience and minimum duration keep the tests fast.
fn test_config() -> PipelineConfig {
    PipelineConfig {
        segmenter: SegmenterConfig {
            voice_threshold: 0.02,
            silence_patience: 2,
            min_utterance_ms: 50,
            sample_rate: 16000,
        },
        detector: DetectorConfig::default(),
        ..PipelineConfig::default()
    }
}

/// Polls until `check` passes or the timeout expires.
async fn wait_until<F: Fn() -> bool>(check: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within timeout"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn spoken_question_is_transcribed_and_recorded() {
    let source = MockAudioSource::new().with_blocks(utterance_blocks());
    let backend = MockBackend::new().with_text("what is the weather");
    let sink = CollectorSink::new();
    let reporter = CollectingReporter::new();

    let handle = Pipeline::start(
        Box::new(source),
        Arc::new(backend),
        Box::new(sink.clone()),
        Arc::new(reporter.clone()),
        test_config(),
    )
    .unwrap();

    wait_until(|| !sink.results().is_empty()).await;
    handle.shutdown().await.unwrap();

    assert_eq!(
        sink.results(),
        vec![LoopResult::Recorded {
            text: "what is the weather".to_string()
        }]
    );
    assert!(reporter.saw(&ListenerStatus::SpeechDetected));
    assert!(reporter.saw(&ListenerStatus::Processing));
    assert!(reporter.saw(&ListenerStatus::Verified {
        text: "what is the weather".to_string()
    }));
}

#[tokio::test]
async fn repeated_question_is_flagged() {
    let mut blocks = utterance_blocks();
    blocks.extend(utterance_blocks());
    let source = MockAudioSource::new().with_blocks(blocks);
    let backend = MockBackend::new()
        .with_text("what is the weather")
        .with_text("what is the weather");
    let sink = CollectorSink::new();

    let handle = Pipeline::start(
        Box::new(source),
        Arc::new(backend),
        Box::new(sink.clone()),
        Arc::new(CollectingReporter::new()),
        test_config(),
    )
    .unwrap();

    wait_until(|| sink.results().len() >= 2).await;
    handle.shutdown().await.unwrap();

    let results = sink.results();
    assert!(matches!(results[0], LoopResult::Recorded { .. }));
    match &results[1] {
        LoopResult::Repeated {
            current, previous, ..
        } => {
            assert_eq!(current, "what is the weather");
            assert_eq!(previous, "what is the weather");
        }
        other => panic!("expected Repeated, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_first_response_does_not_reorder_verdicts() {
    // Two different questions; the first transcription takes longer than
    // the second, so the raw responses arrive out of order.
    let mut blocks = utterance_blocks();
    blocks.extend(utterance_blocks());
    let source = MockAudioSource::new().with_blocks(blocks);
    let backend = MockBackend::new()
        .with_delayed_text("what is the weather", Duration::from_millis(200))
        .with_text("play some music");
    let sink = CollectorSink::new();

    let handle = Pipeline::start(
        Box::new(source),
        Arc::new(backend),
        Box::new(sink.clone()),
        Arc::new(CollectingReporter::new()),
        test_config(),
    )
    .unwrap();

    wait_until(|| sink.results().len() >= 2).await;
    handle.shutdown().await.unwrap();

    assert_eq!(
        sink.results(),
        vec![
            LoopResult::Recorded {
                text: "what is the weather".to_string()
            },
            LoopResult::Recorded {
                text: "play some music".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn unauthorized_speaker_is_ignored() {
    let source = MockAudioSource::new().with_blocks(utterance_blocks());
    let backend = MockBackend::new().with_unauthorized();
    let sink = CollectorSink::new();
    let reporter = CollectingReporter::new();

    let handle = Pipeline::start(
        Box::new(source),
        Arc::new(backend),
        Box::new(sink.clone()),
        Arc::new(reporter.clone()),
        test_config(),
    )
    .unwrap();

    wait_until(|| reporter.saw(&ListenerStatus::Unauthorized)).await;
    handle.shutdown().await.unwrap();

    // Nothing reached the detector.
    assert!(sink.results().is_empty());
}

#[tokio::test]
async fn stranger_between_repeats_does_not_disturb_anchor() {
    let mut blocks = utterance_blocks();
    blocks.extend(utterance_blocks());
    blocks.extend(utterance_blocks());
    let source = MockAudioSource::new().with_blocks(blocks);
    let backend = MockBackend::new()
        .with_text("what is the weather")
        .with_unauthorized()
        .with_text("what is the weather");
    let sink = CollectorSink::new();

    let handle = Pipeline::start(
        Box::new(source),
        Arc::new(backend),
        Box::new(sink.clone()),
        Arc::new(CollectingReporter::new()),
        test_config(),
    )
    .unwrap();

    wait_until(|| sink.results().len() >= 2).await;
    handle.shutdown().await.unwrap();

    let results = sink.results();
    assert!(matches!(results[0], LoopResult::Recorded { .. }));
    assert!(
        matches!(results[1], LoopResult::Repeated { .. }),
        "owner's repeat should still be flagged after a stranger spoke"
    );
}

#[tokio::test]
async fn transport_failure_is_reported_not_fatal() {
    let mut blocks = utterance_blocks();
    blocks.extend(utterance_blocks());
    let source = MockAudioSource::new().with_blocks(blocks);
    let backend = MockBackend::new()
        .with_failure("connection refused")
        .with_text("what is the weather");
    let sink = CollectorSink::new();
    let reporter = CollectingReporter::new();

    let handle = Pipeline::start(
        Box::new(source),
        Arc::new(backend),
        Box::new(sink.clone()),
        Arc::new(reporter.clone()),
        test_config(),
    )
    .unwrap();

    // The utterance after the failure still goes through.
    wait_until(|| !sink.results().is_empty()).await;
    handle.shutdown().await.unwrap();

    assert!(reporter.saw(&ListenerStatus::TransportError {
        message: "Speech server request failed: connection refused".to_string()
    }));
    assert_eq!(
        sink.results(),
        vec![LoopResult::Recorded {
            text: "what is the weather".to_string()
        }]
    );
}

#[tokio::test]
async fn blank_transcript_produces_no_verdict() {
    let source = MockAudioSource::new().with_blocks(utterance_blocks());
    let backend = MockBackend::new(); // exhausted queue → blank transcript
    let sink = CollectorSink::new();
    let reporter = CollectingReporter::new();

    let handle = Pipeline::start(
        Box::new(source),
        Arc::new(backend),
        Box::new(sink.clone()),
        Arc::new(reporter.clone()),
        test_config(),
    )
    .unwrap();

    wait_until(|| reporter.saw(&ListenerStatus::BlankTranscript)).await;
    handle.shutdown().await.unwrap();

    assert!(sink.results().is_empty());
}

#[tokio::test]
async fn glitch_audio_never_reaches_the_backend() {
    // One loud block is under the minimum utterance duration at the
    // default 500ms, so it is discarded without an upload.
    let blocks = vec![loud_block(), quiet_block(), quiet_block(), quiet_block()];
    let source = MockAudioSource::new().with_blocks(blocks);
    let backend = MockBackend::new().with_text("should never be seen");
    let sink = CollectorSink::new();
    let reporter = CollectingReporter::new();

    let config = PipelineConfig {
        segmenter: SegmenterConfig {
            voice_threshold: 0.02,
            silence_patience: 2,
            min_utterance_ms: 500,
            sample_rate: 16000,
        },
        ..test_config()
    };

    let handle = Pipeline::start(
        Box::new(source),
        Arc::new(backend),
        Box::new(sink.clone()),
        Arc::new(reporter.clone()),
        config,
    )
    .unwrap();

    wait_until(|| reporter.saw(&ListenerStatus::SpeechDetected)).await;
    // Give the discard a moment to land, then stop.
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.shutdown().await.unwrap();

    assert!(sink.results().is_empty());
    assert!(!reporter.saw(&ListenerStatus::Processing));
}
