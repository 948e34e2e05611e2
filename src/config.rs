use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the durable `<base>.wav` / `<base>.txt` pairs.
    pub references_dir: PathBuf,
    /// Scratch directory for in-progress recordings before they are saved.
    pub scratch_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000, // model-native rate for reference audio
            channels: 1,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_fills_audio_defaults_when_section_is_absent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("voicebank.toml");
        fs::write(
            &path,
            "[storage]\nreferences_dir = \"/data/references\"\nscratch_dir = \"/tmp/scratch\"\n",
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.storage.references_dir, PathBuf::from("/data/references"));
        assert_eq!(cfg.audio.sample_rate, 24000);
        assert_eq!(cfg.audio.channels, 1);
    }

    #[test]
    fn load_honors_explicit_audio_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("voicebank.toml");
        fs::write(
            &path,
            "[storage]\nreferences_dir = \"refs\"\nscratch_dir = \"scratch\"\n\n[audio]\nsample_rate = 16000\nchannels = 2\n",
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.audio.sample_rate, 16000);
        assert_eq!(cfg.audio.channels, 2);
    }
}
