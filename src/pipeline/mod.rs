pub mod dispatcher;
pub mod effects;
pub mod export;
pub mod recording;
pub mod scheduler;
pub mod sequencer;
pub mod track;
pub mod trigger_table;

pub use dispatcher::PlaybackDispatcher;
pub use effects::distortion_curve;
pub use export::{export, ExportFormat, RenderJob};
pub use recording::PendingRecording;
pub use scheduler::{LookaheadScheduler, TransportState};
pub use sequencer::SequencerEngine;
pub use track::Track;
pub use trigger_table::TriggerTable;
