use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::backend::{AudioSpec, CaptureBackend, PlaybackBackend};
use super::clip::AudioClip;

/// Identifies one recording from start to stop. Returned by a successful
/// [`AudioSessionController::start_recording`]; not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingHandle {
    /// Unique session ID for log correlation.
    pub id: Uuid,
    /// When recording started.
    pub started_at: DateTime<Utc>,
}

struct ActiveRecording {
    handle: RecordingHandle,
    temp_path: PathBuf,
    writer_task: JoinHandle<anyhow::Result<PathBuf>>,
}

/// Single point of control for the microphone and speaker.
///
/// All device failures are best-effort: they are logged and the relevant
/// status flag stays false, rather than being surfaced as errors. At most
/// one recording and one playback are active at a time; starting a new one
/// replaces the old one.
///
/// Operations are expected to run from one sequencing context (no two calls
/// race against each other); the end-of-playback notification arrives
/// asynchronously and is guarded so a superseded playback cannot clear
/// `is_playing` after a newer one set it.
pub struct AudioSessionController {
    capture: Box<dyn CaptureBackend>,
    playback: Box<dyn PlaybackBackend>,
    spec: AudioSpec,
    scratch_dir: PathBuf,
    is_recording: Arc<AtomicBool>,
    is_playing: Arc<AtomicBool>,
    /// Bumped whenever the current playback changes; stale completion tasks
    /// compare against it before touching `is_playing`.
    playback_seq: Arc<AtomicU64>,
    active: Option<ActiveRecording>,
}

impl AudioSessionController {
    pub fn new(
        capture: Box<dyn CaptureBackend>,
        playback: Box<dyn PlaybackBackend>,
        spec: AudioSpec,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            capture,
            playback,
            spec,
            scratch_dir: scratch_dir.into(),
            is_recording: Arc::new(AtomicBool::new(false)),
            is_playing: Arc::new(AtomicBool::new(false)),
            playback_seq: Arc::new(AtomicU64::new(0)),
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::SeqCst)
    }

    /// Begin capturing mono PCM into a fresh scratch-directory WAV file.
    ///
    /// Returns `None` (with a log entry) if the capture device cannot be
    /// opened or the scratch file cannot be created; `is_recording` stays
    /// false in that case. If a recording is already active it is stopped
    /// and its temporary file deleted before the new one starts.
    pub async fn start_recording(&mut self) -> Option<RecordingHandle> {
        if let Some(active) = self.active.take() {
            warn!(
                "Recording {} still active; replacing it and discarding its file",
                active.handle.id
            );
            self.finish_recording(active, true).await;
        }

        if let Err(e) = fs::create_dir_all(&self.scratch_dir) {
            warn!(
                "Cannot create scratch directory {}: {}",
                self.scratch_dir.display(),
                e
            );
            return None;
        }

        let handle = RecordingHandle {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        };
        let temp_path = self.scratch_dir.join(format!("rec-{}.wav", handle.id));

        let mut frames = match self.capture.start(self.spec).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!("Cannot open capture device ({}): {}", self.capture.name(), e);
                return None;
            }
        };

        let wav_spec = hound::WavSpec {
            channels: self.spec.channels,
            sample_rate: self.spec.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = match hound::WavWriter::create(&temp_path, wav_spec) {
            Ok(writer) => writer,
            Err(e) => {
                warn!("Cannot create recording file {}: {}", temp_path.display(), e);
                if let Err(e) = self.capture.stop().await {
                    warn!("Failed to stop capture after writer failure: {}", e);
                }
                return None;
            }
        };

        let task_path = temp_path.clone();
        let writer_task = tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                for &sample in &frame.samples {
                    writer
                        .write_sample(sample)
                        .context("Failed to write sample to WAV")?;
                }
            }
            writer.finalize().context("Failed to finalize WAV file")?;
            Ok(task_path)
        });

        info!("Recording {} started ({})", handle.id, temp_path.display());
        self.is_recording.store(true, Ordering::SeqCst);
        self.active = Some(ActiveRecording {
            handle,
            temp_path,
            writer_task,
        });

        Some(handle)
    }

    /// Stop any active capture and return the just-recorded file, or `None`
    /// when nothing was recording or the recording could not be finalized.
    pub async fn stop_recording(&mut self) -> Option<PathBuf> {
        let active = self.active.take()?;
        info!("Recording {} stopping", active.handle.id);
        self.finish_recording(active, false).await
    }

    async fn finish_recording(&mut self, active: ActiveRecording, discard: bool) -> Option<PathBuf> {
        if let Err(e) = self.capture.stop().await {
            warn!("Failed to stop capture backend: {}", e);
        }

        let result = match active.writer_task.await {
            Ok(Ok(path)) => Some(path),
            Ok(Err(e)) => {
                warn!("Recording {} failed: {:#}", active.handle.id, e);
                let _ = fs::remove_file(&active.temp_path);
                None
            }
            Err(e) => {
                warn!("Recording writer task panicked: {}", e);
                let _ = fs::remove_file(&active.temp_path);
                None
            }
        };

        self.is_recording.store(false, Ordering::SeqCst);

        if discard {
            if let Some(path) = &result {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Cannot delete superseded recording {}: {}", path.display(), e);
                }
            }
            return None;
        }

        result
    }

    /// Stop any current playback, then play the given WAV file.
    ///
    /// Decode and device failures are logged and leave `is_playing` false.
    /// On success `is_playing` is true when this returns and flips back to
    /// false when the playback reaches end-of-file. While the previous
    /// playback is torn down the flag may transiently read false.
    pub async fn play(&mut self, path: impl AsRef<Path>) {
        if self.is_playing.load(Ordering::SeqCst) {
            self.playback_seq.fetch_add(1, Ordering::SeqCst);
            if let Err(e) = self.playback.stop().await {
                warn!("Failed to stop previous playback: {}", e);
            }
            self.is_playing.store(false, Ordering::SeqCst);
        }

        let path = path.as_ref();
        let clip = match AudioClip::open(path) {
            Ok(clip) => clip,
            Err(e) => {
                warn!("Cannot play {}: {:#}", path.display(), e);
                return;
            }
        };

        let duration = clip.duration_seconds();
        let done = match self.playback.play(clip.samples, clip.spec).await {
            Ok(done) => done,
            Err(e) => {
                warn!("Cannot start playback ({}): {}", self.playback.name(), e);
                return;
            }
        };

        let seq = self.playback_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.is_playing.store(true, Ordering::SeqCst);
        info!("Playback started: {} ({:.1}s)", clip.path, duration);

        // Completion is scoped to this one playback: if a newer playback has
        // taken over by the time this resolves, leave the flag alone.
        let is_playing = Arc::clone(&self.is_playing);
        let playback_seq = Arc::clone(&self.playback_seq);
        tokio::spawn(async move {
            done.wait().await;
            if playback_seq.load(Ordering::SeqCst) == seq {
                is_playing.store(false, Ordering::SeqCst);
            }
        });
    }

    /// Stop playback immediately if active. Idempotent.
    pub async fn stop_playback(&mut self) {
        self.playback_seq.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.playback.stop().await {
            warn!("Failed to stop playback: {}", e);
        }
        self.is_playing.store(false, Ordering::SeqCst);
    }
}
