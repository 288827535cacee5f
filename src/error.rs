//! Crate-level error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::port::PortError;

/// Errors raised while setting up or driving an audio session.
///
/// Reconciliation itself never fails: descriptors it cannot key are skipped.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("output device not found: {0}")]
    DeviceNotFound(String),

    #[cfg(feature = "cpal_sink")]
    #[error("failed to query output device configuration: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal_sink")]
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal_sink")]
    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal_sink")]
    #[error("unsupported sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("output stream thread exited before the stream started")]
    StreamThread,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
