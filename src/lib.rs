//! voicebank — reference-sample session management for voice-cloning TTS.
//!
//! A reference sample is a durable (audio recording, transcript) pair used
//! to condition speech generation on a target voice. This crate provides:
//!
//! - [`AudioSessionController`]: microphone capture and speaker playback
//!   behind a small start/stop/play/stop contract with status flags
//! - [`ReferenceSampleStore`]: the durable pair collection on a local
//!   directory, plus the shared [`SelectionSlot`]
//! - [`TtsEngine`]: lifecycle and progress/cancellation plumbing around an
//!   external [`SpeechModel`](synth::SpeechModel)
//!
//! Capture and playback hardware is behind the `CaptureBackend` /
//! `PlaybackBackend` traits; real devices (cpal/rodio) are available with
//! the `hardware` feature, and in-memory backends ship for tests and batch
//! use.

pub mod audio;
pub mod config;
pub mod error;
pub mod store;
pub mod synth;

pub use audio::{
    AudioClip, AudioFrame, AudioSessionController, AudioSpec, CaptureBackend, MemoryCapture,
    MemoryPlayback, MemoryPlaybackMonitor, PlaybackBackend, RecordingHandle,
};
pub use config::Config;
pub use error::{DeviceError, LoadError, StoreError, SynthesisError};
pub use store::{ReferenceSample, ReferenceSampleStore, SelectionSlot};
pub use synth::{GeneratedAudio, GenerationEvent, GenerationTask, TtsEngine, SAMPLE_RATE};
