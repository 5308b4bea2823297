/// Errors surfaced by the sequencer core.
///
/// An armed step on a track without a sample is not an error; the dispatcher
/// skips it silently.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("Unsupported audio device: {0}")]
    UnsupportedDevice(String),

    #[error("Could not decode captured audio: {0}")]
    DecodeFailure(String),

    #[error("Audio clock unavailable")]
    ClockUnavailable,

    #[error("Invalid tempo: {0} bpm")]
    InvalidTempo(f64),

    #[error("Track index {0} out of range")]
    TrackOutOfRange(usize),

    #[error("Step index {0} out of range")]
    StepOutOfRange(usize),

    #[error("Invalid PCM buffer: {0}")]
    InvalidBuffer(String),

    #[error("Encoder error: {0}")]
    Encode(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
