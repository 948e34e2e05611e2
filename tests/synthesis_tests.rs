// Tests for the synthesis orchestration seam
//
// The speech model is faked; these verify the engine's two-state lifecycle,
// the shape of the progress event stream (clamped, monotone, exactly one
// terminal event), and cancellation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use voicebank::synth::{GenerationEvent, SpeechModel, SynthesisRequest, TtsEngine};
use voicebank::SynthesisError;

/// Model that replays a fixed sequence of raw progress values.
struct ScriptedModel {
    reports: Vec<f32>,
    outcome: Result<Vec<f32>, String>,
}

impl SpeechModel for ScriptedModel {
    fn synthesize(
        &self,
        _request: &SynthesisRequest,
        progress: &mut dyn FnMut(f32) -> bool,
    ) -> Result<Vec<f32>, String> {
        for &p in &self.reports {
            if !progress(p) {
                return Err("stopped".to_string());
            }
        }
        self.outcome.clone()
    }
}

/// Model that ticks slowly until told to stop, for cancellation tests.
struct SlowModel;

impl SpeechModel for SlowModel {
    fn synthesize(
        &self,
        _request: &SynthesisRequest,
        progress: &mut dyn FnMut(f32) -> bool,
    ) -> Result<Vec<f32>, String> {
        for i in 0..200 {
            if !progress(i as f32 / 200.0) {
                return Err("stopped".to_string());
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok(vec![0.0; 240])
    }
}

/// Model that records the request it was given.
struct RecordingModel {
    seen: Arc<Mutex<Option<SynthesisRequest>>>,
}

impl SpeechModel for RecordingModel {
    fn synthesize(
        &self,
        request: &SynthesisRequest,
        progress: &mut dyn FnMut(f32) -> bool,
    ) -> Result<Vec<f32>, String> {
        *self.seen.lock().unwrap() = Some(request.clone());
        progress(1.0);
        Ok(vec![0.25; 2400])
    }
}

#[tokio::test]
async fn test_generate_before_initialization_is_a_typed_error() {
    let engine = TtsEngine::new();
    assert!(!engine.is_ready());

    let result = engine.generate("hello", None);
    assert!(matches!(result, Err(SynthesisError::NotInitialized)));
}

#[tokio::test]
async fn test_progress_stream_is_clamped_and_monotone() {
    let mut engine = TtsEngine::new();
    engine.initialize(Arc::new(ScriptedModel {
        // Raw callbacks jitter, regress, and overshoot.
        reports: vec![0.2, 0.1, 0.5, 1.4, 0.9],
        outcome: Ok(vec![0.5; 480]),
    }));
    assert!(engine.is_ready());

    let mut task = engine.generate("hello", None).unwrap();
    let mut fractions = Vec::new();
    let mut completed = None;

    while let Some(event) = task.next_event().await {
        match event {
            GenerationEvent::Progress(f) => fractions.push(f),
            GenerationEvent::Completed(audio) => completed = Some(audio),
            GenerationEvent::Failed(e) => panic!("unexpected failure: {e}"),
        }
    }

    assert_eq!(fractions, vec![0.2, 0.5, 1.0]);

    let audio = completed.expect("stream must end with a terminal event");
    assert_eq!(audio.sample_rate, voicebank::SAMPLE_RATE);
    assert_eq!(audio.samples.len(), 480);
}

#[tokio::test]
async fn test_model_failure_yields_terminal_failed_event() {
    let mut engine = TtsEngine::new();
    engine.initialize(Arc::new(ScriptedModel {
        reports: vec![0.3],
        outcome: Err("out of memory".to_string()),
    }));

    let mut task = engine.generate("hello", None).unwrap();
    let mut failure = None;

    while let Some(event) = task.next_event().await {
        if let GenerationEvent::Failed(e) = event {
            failure = Some(e);
        }
    }

    assert_eq!(failure.as_deref(), Some("out of memory"));
}

#[tokio::test]
async fn test_cancellation_ends_stream_without_terminal_event() {
    let mut engine = TtsEngine::new();
    engine.initialize(Arc::new(SlowModel));

    let mut task = engine.generate("a long passage", None).unwrap();

    // Wait for the run to actually start, then cancel it.
    let first = task.next_event().await;
    assert!(matches!(first, Some(GenerationEvent::Progress(_))));
    task.cancel();

    // Whatever progress was already in flight may still arrive, but the
    // stream must end without Completed or Failed.
    while let Some(event) = task.next_event().await {
        assert!(
            matches!(event, GenerationEvent::Progress(_)),
            "cancelled run must not emit a terminal event, got {event:?}"
        );
    }
}

#[tokio::test]
async fn test_conditioning_input_reaches_the_model() {
    let seen = Arc::new(Mutex::new(None));
    let mut engine = TtsEngine::new();
    engine.initialize(Arc::new(RecordingModel {
        seen: Arc::clone(&seen),
    }));

    let sample = voicebank::ReferenceSample {
        audio_path: "/refs/voice.wav".into(),
        transcript: "my voice".to_string(),
    };

    let mut task = engine.generate("say this", Some(&sample)).unwrap();
    while task.next_event().await.is_some() {}

    let request = seen.lock().unwrap().clone().expect("model was invoked");
    assert_eq!(request.text, "say this");
    let conditioning = request.reference.expect("conditioning should be passed");
    assert_eq!(conditioning.audio_path, sample.audio_path);
    assert_eq!(conditioning.transcript, "my voice");
}

#[tokio::test]
async fn test_generate_without_reference_passes_none() {
    let seen = Arc::new(Mutex::new(None));
    let mut engine = TtsEngine::new();
    engine.initialize(Arc::new(RecordingModel {
        seen: Arc::clone(&seen),
    }));

    let mut task = engine.generate("plain voice", None).unwrap();
    while task.next_event().await.is_some() {}

    let request = seen.lock().unwrap().clone().expect("model was invoked");
    assert!(request.reference.is_none());
}
