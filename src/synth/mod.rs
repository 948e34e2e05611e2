//! Orchestration around the external speech model.
//!
//! The model itself is an opaque collaborator behind [`SpeechModel`]; this
//! module owns its lifecycle (a model is attached or it is not) and turns
//! its raw progress callback into a cancellable task yielding a stream of
//! well-behaved progress events.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::SynthesisError;
use crate::store::ReferenceSample;

/// Sample rate of generated audio, matching the reference recordings.
pub const SAMPLE_RATE: u32 = 24000;

/// Optional conditioning input: reference audio plus its transcript,
/// influencing the generated voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditioning {
    pub audio_path: PathBuf,
    pub transcript: String,
}

impl From<&ReferenceSample> for Conditioning {
    fn from(sample: &ReferenceSample) -> Self {
        Self {
            audio_path: sample.audio_path.clone(),
            transcript: sample.transcript.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub reference: Option<Conditioning>,
}

/// The external text-to-speech model, treated as a black box.
///
/// `synthesize` blocks until done, reporting fractional completion through
/// `progress`; it should stop early (returning whatever error it likes) when
/// the callback returns `false`.
pub trait SpeechModel: Send + Sync {
    fn synthesize(
        &self,
        request: &SynthesisRequest,
        progress: &mut dyn FnMut(f32) -> bool,
    ) -> Result<Vec<f32>, String>;
}

/// Mono audio produced by a completed generation.
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// One element of a generation's event stream: zero or more `Progress`
/// events (clamped to 0..=1, monotonically non-decreasing) terminated by
/// exactly one `Completed` or `Failed` — unless the task is cancelled, in
/// which case the stream simply ends.
#[derive(Debug)]
pub enum GenerationEvent {
    Progress(f32),
    Completed(GeneratedAudio),
    Failed(String),
}

/// An in-flight generation. Dropping it does not stop the model; call
/// [`cancel`](Self::cancel) for that.
pub struct GenerationTask {
    events: mpsc::Receiver<GenerationEvent>,
    cancelled: Arc<AtomicBool>,
    _worker: JoinHandle<()>,
}

impl GenerationTask {
    /// Next event, or `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<GenerationEvent> {
        self.events.recv().await
    }

    /// Ask the model to stop at its next progress report. The event stream
    /// ends without a terminal event.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Two-state wrapper around the speech model: `generate` is only callable
/// once a model has been attached, and returns a typed error otherwise
/// rather than silently doing nothing.
pub struct TtsEngine {
    model: Option<Arc<dyn SpeechModel>>,
}

impl TtsEngine {
    /// An engine with no model attached yet.
    pub fn new() -> Self {
        Self { model: None }
    }

    /// Attach the loaded model, moving the engine to the ready state.
    pub fn initialize(&mut self, model: Arc<dyn SpeechModel>) {
        info!("Speech model attached; engine ready");
        self.model = Some(model);
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Start generating speech for `text`, optionally conditioned on a
    /// reference sample. The model runs on a blocking worker; consume the
    /// returned task's event stream for progress and the final result.
    pub fn generate(
        &self,
        text: impl Into<String>,
        reference: Option<&ReferenceSample>,
    ) -> Result<GenerationTask, SynthesisError> {
        let model = self
            .model
            .as_ref()
            .cloned()
            .ok_or(SynthesisError::NotInitialized)?;

        let request = SynthesisRequest {
            text: text.into(),
            reference: reference.map(Conditioning::from),
        };

        let (tx, rx) = mpsc::channel(32);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let worker = tokio::task::spawn_blocking(move || {
            let progress_tx = tx.clone();
            let cancel_flag = Arc::clone(&flag);
            let mut last = 0.0f32;

            // Raw model callbacks may jitter or regress; the stream the UI
            // sees is clamped and monotone.
            let mut progress = move |raw: f32| -> bool {
                if cancel_flag.load(Ordering::SeqCst) {
                    return false;
                }
                let clamped = raw.clamp(0.0, 1.0);
                if clamped > last {
                    last = clamped;
                    let _ = progress_tx.blocking_send(GenerationEvent::Progress(clamped));
                }
                true
            };

            let outcome = model.synthesize(&request, &mut progress);

            // A cancelled run ends the stream with no terminal event.
            if flag.load(Ordering::SeqCst) {
                return;
            }
            let event = match outcome {
                Ok(samples) => GenerationEvent::Completed(GeneratedAudio {
                    samples,
                    sample_rate: SAMPLE_RATE,
                }),
                Err(e) => GenerationEvent::Failed(e),
            };
            let _ = tx.blocking_send(event);
        });

        Ok(GenerationTask {
            events: rx,
            cancelled,
            _worker: worker,
        })
    }
}

impl Default for TtsEngine {
    fn default() -> Self {
        Self::new()
    }
}
