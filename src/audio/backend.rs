use tokio::sync::{mpsc, oneshot};

use crate::error::DeviceError;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

/// Capture/playback format
#[derive(Debug, Clone, Copy)]
pub struct AudioSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioSpec {
    fn default() -> Self {
        Self {
            sample_rate: 24000, // reference audio is mono 24 kHz
            channels: 1,
        }
    }
}

/// Resolves when a playback started via [`PlaybackBackend::play`] reaches
/// end-of-file (or when the backend is told to stop). Scoped to that one
/// playback; a new `play` gets a new handle.
pub struct PlaybackDone {
    rx: oneshot::Receiver<()>,
}

impl PlaybackDone {
    pub fn new() -> (PlaybackFinisher, Self) {
        let (tx, rx) = oneshot::channel();
        (PlaybackFinisher { tx: Some(tx) }, Self { rx })
    }

    /// Wait for the playback to finish. Returns even if the backend dropped
    /// the finisher without signalling.
    pub async fn wait(self) {
        let _ = self.rx.await;
    }
}

/// Backend-side half of [`PlaybackDone`].
pub struct PlaybackFinisher {
    tx: Option<oneshot::Sender<()>>,
}

impl PlaybackFinisher {
    pub fn finish(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Microphone-side backend trait
///
/// Implementations:
/// - `hardware` feature: cpal microphone on a dedicated thread
/// - [`MemoryCapture`](super::memory::MemoryCapture): canned samples for
///   tests and batch processing
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing audio in the requested format.
    ///
    /// Returns a channel receiver that will receive audio frames. The stream
    /// ends (receiver yields `None`) once the backend stops or runs out of
    /// input.
    async fn start(&mut self, spec: AudioSpec) -> Result<mpsc::Receiver<AudioFrame>, DeviceError>;

    /// Stop capturing audio. Idempotent.
    async fn stop(&mut self) -> Result<(), DeviceError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Speaker-side backend trait
#[async_trait::async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Start playing the given samples, replacing any playback this backend
    /// is already doing. The returned handle resolves at end-of-file.
    async fn play(
        &mut self,
        samples: Vec<i16>,
        spec: AudioSpec,
    ) -> Result<PlaybackDone, DeviceError>;

    /// Stop playback immediately. Idempotent when nothing is playing.
    async fn stop(&mut self) -> Result<(), DeviceError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
