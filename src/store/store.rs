use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::sample::ReferenceSample;
use super::selection::SelectionSlot;
use crate::audio::{AudioSessionController, RecordingHandle};
use crate::error::{LoadError, StoreError};

const AUDIO_EXT: &str = "wav";
const TEXT_EXT: &str = "txt";

/// Manages the durable reference sample collection on a local directory,
/// the shared selection slot, and audio I/O via [`AudioSessionController`].
///
/// The directory listing is the source of truth: there is no index file, and
/// [`load_reference_samples`](Self::load_reference_samples) replaces the
/// in-memory list wholesale with whatever readable pairs are on disk.
pub struct ReferenceSampleStore {
    references_dir: PathBuf,
    samples: Vec<ReferenceSample>,
    selection: SelectionSlot,
    audio: AudioSessionController,
}

impl ReferenceSampleStore {
    pub fn new(
        references_dir: impl Into<PathBuf>,
        selection: SelectionSlot,
        audio: AudioSessionController,
    ) -> Self {
        Self {
            references_dir: references_dir.into(),
            samples: Vec::new(),
            selection,
            audio,
        }
    }

    /// The reference samples found at the last load, sorted by filename.
    pub fn samples(&self) -> &[ReferenceSample] {
        &self.samples
    }

    /// Handle to the shared selection slot. Clone it into every component
    /// that needs to observe the current selection.
    pub fn selection(&self) -> &SelectionSlot {
        &self.selection
    }

    /// Rescan the reference directory and replace the in-memory list.
    ///
    /// Audio files without a readable sibling transcript are skipped with a
    /// log entry. A missing or unreadable directory yields an empty list
    /// rather than an error.
    pub fn load_reference_samples(&mut self) {
        match scan_pairs(&self.references_dir) {
            Ok(samples) => {
                info!(
                    "Loaded {} reference sample(s) from {}",
                    samples.len(),
                    self.references_dir.display()
                );
                self.samples = samples;
            }
            Err(e) => {
                warn!("Reference sample load failed: {}", e);
                self.samples = Vec::new();
            }
        }
    }

    /// Persist a recorded audio file and its transcript as a new reference
    /// pair, then reload the list.
    ///
    /// The pair is written atomically from the caller's point of view: on
    /// any failure the half-written file(s) are removed before the error is
    /// returned, so no audio file ever appears without its transcript.
    pub fn save_reference_audio(
        &mut self,
        source: &Path,
        transcript: &str,
    ) -> Result<ReferenceSample, StoreError> {
        if transcript.trim().is_empty() {
            return Err(StoreError::Validation(
                "transcript must not be empty".to_string(),
            ));
        }

        fs::create_dir_all(&self.references_dir).map_err(|e| {
            StoreError::storage(
                format!(
                    "create reference directory {}",
                    self.references_dir.display()
                ),
                e,
            )
        })?;

        let base = unique_basename();
        let sample = persist_pair(&self.references_dir, &base, source, transcript)?;

        info!(
            "Saved reference sample {} ({} chars of transcript)",
            sample.audio_path.display(),
            transcript.len()
        );

        self.load_reference_samples();
        Ok(sample)
    }

    /// Set or clear the shared selection slot. The sample need not be a
    /// member of the loaded list.
    pub fn select_reference(&self, sample: Option<ReferenceSample>) {
        self.selection.select(sample);
    }

    // Audio forwarding. Device failures are logged by the controller and
    // never surfaced here.

    pub async fn start_recording(&mut self) -> Option<RecordingHandle> {
        self.audio.start_recording().await
    }

    pub async fn stop_recording(&mut self) -> Option<PathBuf> {
        self.audio.stop_recording().await
    }

    pub async fn play_audio(&mut self, path: impl AsRef<Path>) {
        self.audio.play(path).await
    }

    pub async fn stop_playback(&mut self) {
        self.audio.stop_playback().await
    }

    pub fn is_recording(&self) -> bool {
        self.audio.is_recording()
    }

    pub fn is_playing(&self) -> bool {
        self.audio.is_playing()
    }
}

/// Collision-resistant basename for a new pair: millisecond timestamp plus a
/// random suffix for same-instant saves.
fn unique_basename() -> String {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ref-{}-{}", stamp, &suffix[..8])
}

/// Write `<base>.wav` / `<base>.txt` under `dir`, rolling back on failure so
/// at most both or neither remain.
fn persist_pair(
    dir: &Path,
    base: &str,
    source: &Path,
    transcript: &str,
) -> Result<ReferenceSample, StoreError> {
    let audio_path = dir.join(format!("{base}.{AUDIO_EXT}"));
    let text_path = dir.join(format!("{base}.{TEXT_EXT}"));

    if let Err(e) = fs::copy(source, &audio_path) {
        let _ = fs::remove_file(&audio_path);
        return Err(StoreError::storage(
            format!("copy reference audio to {}", audio_path.display()),
            e,
        ));
    }

    if let Err(e) = fs::write(&text_path, transcript) {
        let _ = fs::remove_file(&text_path);
        let _ = fs::remove_file(&audio_path);
        return Err(StoreError::storage(
            format!("write transcript {}", text_path.display()),
            e,
        ));
    }

    Ok(ReferenceSample {
        audio_path,
        transcript: transcript.to_string(),
    })
}

/// List the readable (audio, transcript) pairs under `dir`, sorted by
/// filename so a fixed directory state always yields the same list.
fn scan_pairs(dir: &Path) -> Result<Vec<ReferenceSample>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|e| LoadError::Directory {
        dir: dir.to_path_buf(),
        source: e,
    })?;

    let mut samples = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let audio_path = entry.path();
        let is_audio = audio_path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(AUDIO_EXT))
            .unwrap_or(false);
        if !is_audio {
            continue;
        }

        let text_path = audio_path.with_extension(TEXT_EXT);
        match fs::read_to_string(&text_path) {
            Ok(transcript) => samples.push(ReferenceSample {
                audio_path,
                transcript,
            }),
            Err(e) => {
                // Half a pair is not a reference sample.
                warn!(
                    "Skipping {}: {}",
                    audio_path.display(),
                    LoadError::Transcript {
                        path: text_path,
                        source: e,
                    }
                );
            }
        }
    }

    samples.sort_by(|a, b| a.audio_path.cmp(&b.audio_path));
    Ok(samples)
}
