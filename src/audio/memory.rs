//! In-process capture and playback backends.
//!
//! These stand in for real hardware in tests and batch processing: capture
//! replays a canned sample buffer as a frame stream, playback records what it
//! was asked to do and lets the caller simulate end-of-file.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use super::backend::{
    AudioFrame, AudioSpec, CaptureBackend, PlaybackBackend, PlaybackDone, PlaybackFinisher,
};
use crate::error::DeviceError;

/// Capture backend that replays a fixed sample buffer.
///
/// `start` streams the buffer as 100 ms frames and then ends the stream, so
/// a recording drains deterministically without an explicit stop.
pub struct MemoryCapture {
    samples: Vec<i16>,
    available: bool,
}

impl MemoryCapture {
    pub fn new(samples: Vec<i16>) -> Self {
        Self {
            samples,
            available: true,
        }
    }

    /// A capture device that refuses to open, for exercising the
    /// fail-silently-to-log path.
    pub fn unavailable() -> Self {
        Self {
            samples: Vec::new(),
            available: false,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MemoryCapture {
    async fn start(&mut self, spec: AudioSpec) -> Result<mpsc::Receiver<AudioFrame>, DeviceError> {
        if !self.available {
            return Err(DeviceError::Unavailable(
                "memory capture configured as unavailable".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(32);
        let samples = self.samples.clone();
        let frame_len = (spec.sample_rate as usize / 10).max(1) * spec.channels as usize;

        tokio::spawn(async move {
            for chunk in samples.chunks(frame_len) {
                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate: spec.sample_rate,
                    channels: spec.channels,
                };
                if tx.send(frame).await.is_err() {
                    break; // receiver gone, recording was torn down
                }
            }
            debug!("Memory capture drained");
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory-capture"
    }
}

/// What a [`MemoryPlayback`] backend was asked to do, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// `play` was called with this many samples.
    Play { sample_count: usize },
    /// `stop` was called.
    Stop,
}

struct PlaybackState {
    events: Vec<PlaybackEvent>,
    current: Option<PlaybackFinisher>,
}

/// Playback backend that records calls instead of producing sound.
///
/// Playback stays "active" until `stop` or [`MemoryPlaybackMonitor::finish_current`]
/// fires the completion handle, mimicking a long file.
pub struct MemoryPlayback {
    state: Arc<Mutex<PlaybackState>>,
}

impl MemoryPlayback {
    pub fn new() -> (Self, MemoryPlaybackMonitor) {
        let state = Arc::new(Mutex::new(PlaybackState {
            events: Vec::new(),
            current: None,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MemoryPlaybackMonitor { state },
        )
    }
}

#[async_trait::async_trait]
impl PlaybackBackend for MemoryPlayback {
    async fn play(
        &mut self,
        samples: Vec<i16>,
        _spec: AudioSpec,
    ) -> Result<PlaybackDone, DeviceError> {
        let (finisher, done) = PlaybackDone::new();

        let mut state = self.state.lock().expect("playback state poisoned");
        state.events.push(PlaybackEvent::Play {
            sample_count: samples.len(),
        });
        // A superseded playback ends at the moment the new one starts.
        if let Some(prev) = state.current.take() {
            prev.finish();
        }
        state.current = Some(finisher);

        Ok(done)
    }

    async fn stop(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().expect("playback state poisoned");
        state.events.push(PlaybackEvent::Stop);
        if let Some(current) = state.current.take() {
            current.finish();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory-playback"
    }
}

/// Test-side handle observing a [`MemoryPlayback`] backend.
#[derive(Clone)]
pub struct MemoryPlaybackMonitor {
    state: Arc<Mutex<PlaybackState>>,
}

impl MemoryPlaybackMonitor {
    /// Call log so far.
    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.state
            .lock()
            .expect("playback state poisoned")
            .events
            .clone()
    }

    /// Whether a playback is currently held open.
    pub fn has_active_playback(&self) -> bool {
        self.state
            .lock()
            .expect("playback state poisoned")
            .current
            .is_some()
    }

    /// Simulate the current playback reaching end-of-file.
    pub fn finish_current(&self) {
        let finisher = self
            .state
            .lock()
            .expect("playback state poisoned")
            .current
            .take();
        if let Some(finisher) = finisher {
            finisher.finish();
        }
    }
}
