use std::path::PathBuf;

/// A durable (audio recording, transcript) pair used to condition speech
/// generation on a target voice.
///
/// Created only by a successful save or a load from the reference directory;
/// both halves exist on disk whenever one of these is handed out. Immutable
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSample {
    /// Location of the mono 24 kHz WAV recording.
    pub audio_path: PathBuf,
    /// The text spoken in that recording. Non-empty by construction.
    pub transcript: String,
}
