use std::path::Path;

use anyhow::{Context, Result};
use hound::WavReader;
use tracing::debug;

use super::backend::AudioSpec;

/// A decoded WAV file held in memory, ready to hand to a playback backend.
pub struct AudioClip {
    pub path: String,
    pub spec: AudioSpec,
    pub samples: Vec<i16>,
}

impl AudioClip {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        debug!(
            "Audio clip loaded: {} ({:.1}s, {}Hz, {} channels)",
            path.display(),
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64),
            spec.sample_rate,
            spec.channels
        );

        Ok(Self {
            path: path.display().to_string(),
            spec: AudioSpec {
                sample_rate: spec.sample_rate,
                channels: spec.channels,
            },
            samples,
        })
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / (self.spec.sample_rate as f64 * self.spec.channels as f64)
    }
}
