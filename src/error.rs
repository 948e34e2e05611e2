use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to the caller by [`crate::ReferenceSampleStore`].
///
/// Only validation and storage failures during a save are actionable by the
/// UI layer; device and load failures are logged and degrade gracefully
/// instead (see [`DeviceError`] and [`LoadError`]).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller supplied invalid input (e.g. an empty transcript).
    #[error("invalid input: {0}")]
    Validation(String),

    /// A filesystem operation failed. Partial writes have already been
    /// rolled back when this is returned from a save.
    #[error("{action}: {source}")]
    Storage {
        action: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn storage(action: impl Into<String>, source: io::Error) -> Self {
        Self::Storage {
            action: action.into(),
            source,
        }
    }
}

/// Microphone/speaker failures. Never returned to the store's caller:
/// recording and playback are best-effort, so these are logged and the
/// corresponding status flag stays false.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("audio device permission denied")]
    PermissionDenied,

    #[error("no usable audio device: {0}")]
    Unavailable(String),

    #[error("audio backend failure: {0}")]
    Backend(String),
}

/// Failures while scanning the reference directory or decoding one pair.
/// Logged only; the loaded list degrades to empty or partial.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read reference directory {dir}: {source}")]
    Directory {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read transcript {path}: {source}")]
    Transcript {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors from the synthesis orchestration seam.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The engine has no model attached yet. Callers must initialize the
    /// engine before generating; this is a typed error, not a silent no-op.
    #[error("speech model not initialized")]
    NotInitialized,

    /// The underlying model reported a failure.
    #[error("speech model failure: {0}")]
    Model(String),
}
