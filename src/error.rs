//! Error types for the synth engine.

use thiserror::Error;

/// Result type for engine operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors that can occur while configuring, starting or rendering the synth.
///
/// None of these are fatal to the host: a failed start leaves the engine
/// inert and every other path degrades to silence.
#[derive(Debug, Error)]
pub enum SynthError {
    /// The platform reports no default output device.
    #[error("no audio output device available")]
    NoOutputDevice,

    /// The device cannot play 16-bit PCM at the requested rate.
    #[error("raw audio format not supported by backend: {sample_rate} Hz, {channels} channel(s)")]
    UnsupportedFormat {
        /// Requested sample rate.
        sample_rate: u32,
        /// Requested source channel count.
        channels: u16,
    },

    /// Querying the device's supported configurations failed.
    #[error("failed to query output device: {0}")]
    DeviceQuery(#[from] cpal::SupportedStreamConfigsError),

    /// The output stream could not be built.
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    /// The output stream could not be started.
    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// `start()` was called on a running engine.
    #[error("synth engine is already started")]
    AlreadyStarted,

    /// The audio thread ended before reporting whether the device opened.
    #[error("audio service thread exited during startup")]
    WorkerExited,

    /// A note name could not be parsed.
    #[error("invalid note '{0}'")]
    InvalidNote(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The platform has no per-user configuration directory.
    #[error("could not find config directory")]
    NoConfigDir,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be (de)serialized.
    #[error("settings format error: {0}")]
    Json(#[from] serde_json::Error),

    /// WAV encoding error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl SynthError {
    /// True for failures that mean "this machine cannot play our format".
    pub fn is_device_unavailable(&self) -> bool {
        matches!(
            self,
            SynthError::NoOutputDevice
                | SynthError::UnsupportedFormat { .. }
                | SynthError::DeviceQuery(_)
                | SynthError::BuildStream(_)
                | SynthError::PlayStream(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_failures_are_classified() {
        assert!(SynthError::NoOutputDevice.is_device_unavailable());
        assert!(SynthError::UnsupportedFormat {
            sample_rate: 22050,
            channels: 1
        }
        .is_device_unavailable());
        assert!(!SynthError::AlreadyStarted.is_device_unavailable());
        assert!(!SynthError::InvalidConfig("buffer".into()).is_device_unavailable());
    }
}
