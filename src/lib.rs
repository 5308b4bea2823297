pub mod audio;
pub mod audio_api;
pub mod config;
pub mod encode;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod shared;

pub use audio_api::{AudioHost, CaptureDevice, Clock, PlaybackRequest};
pub use config::{load_config, save_config, EngineConfig};
pub use encode::{encode_mp3, encode_wav};
pub use error::{EngineError, Result};
pub use pipeline::{ExportFormat, PendingRecording, SequencerEngine, TriggerTable};
pub use shared::{TriggerEvent, NUM_STEPS, NUM_TRACKS};
