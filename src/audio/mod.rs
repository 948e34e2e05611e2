pub mod backend;
pub mod clip;
pub mod memory;
pub mod session;

#[cfg(feature = "hardware")]
pub mod hardware;

pub use backend::{
    AudioFrame, AudioSpec, CaptureBackend, PlaybackBackend, PlaybackDone, PlaybackFinisher,
};
pub use clip::AudioClip;
pub use memory::{MemoryCapture, MemoryPlayback, MemoryPlaybackMonitor, PlaybackEvent};
pub use session::{AudioSessionController, RecordingHandle};

#[cfg(feature = "hardware")]
pub use hardware::{CpalCapture, RodioPlayback};
