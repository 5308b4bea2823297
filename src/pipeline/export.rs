// Offline bounce of the current grid, and the format switch for export.
//
// The live version of this pipeline would capture the master bus for a
// precomputed duration and stop on a timer. Here the render runs against a
// virtual clock, so the returned buffer is always exactly the loops plus the
// tail, and the call returning is the completion signal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::{decode_container, encode_container, OfflineHost, PcmBuffer, CONTAINER_EXTENSION};
use crate::config::EngineConfig;
use crate::encode::{encode_mp3, encode_wav};
use crate::error::{EngineError, Result};
use crate::shared::{loop_duration, NUM_STEPS};

use super::dispatcher::PlaybackDispatcher;
use super::scheduler::LookaheadScheduler;
use super::track::Track;
use super::trigger_table::TriggerTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Wav,
    Mp3,
    /// The host's capture container, untouched
    RawContainer,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
            ExportFormat::RawContainer => CONTAINER_EXTENSION,
        }
    }

    pub fn file_name(&self) -> String {
        format!("beat.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
            ExportFormat::RawContainer => "raw",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Ok(ExportFormat::Wav),
            "mp3" => Ok(ExportFormat::Mp3),
            "raw" | "container" | "rawcontainer" => Ok(ExportFormat::RawContainer),
            other => Err(EngineError::Config(format!("unknown export format {:?}", other))),
        }
    }
}

/// Everything a bounce needs, borrowed from the engine.
pub struct RenderJob<'a> {
    pub grid: TriggerTable,
    pub tracks: &'a [Track],
    pub dispatcher: &'a PlaybackDispatcher,
    pub config: &'a EngineConfig,
    pub tempo_bpm: f64,
}

impl RenderJob<'_> {
    pub fn total_steps(&self) -> usize {
        NUM_STEPS * self.config.loop_count as usize
    }

    pub fn duration_secs(&self) -> f64 {
        loop_duration(self.tempo_bpm, self.config.loop_count) + self.config.tail_secs
    }

    /// Run the scheduler over a virtual clock and mix the result.
    pub fn render(&self) -> Result<PcmBuffer> {
        let config = self.config;
        let mut host = OfflineHost::new(config.render_sample_rate);
        let mut scheduler = LookaheadScheduler::new(self.tempo_bpm, config.schedule_ahead_secs)?;
        scheduler.start(&host)?;

        let total_steps = self.total_steps();
        let interval = config.tick_interval().as_secs_f64();
        let mut emitted = 0;
        let mut now = 0.0;
        while emitted < total_steps {
            scheduler.tick(now, |event| {
                // steps past the last loop only exist because of the lookahead
                if emitted < total_steps {
                    self.dispatcher.dispatch(event, &self.grid, self.tracks, &mut host);
                }
                emitted += 1;
            });
            now += interval;
            host.advance_to(now);
        }
        scheduler.stop();

        log::debug!(
            "offline render: {} steps, {} triggers, {:.2}s",
            total_steps,
            host.requests().len(),
            self.duration_secs()
        );
        host.render(self.duration_secs(), config.render_channels, config.master_gain)
    }
}

/// Package a rendered mix. The mix always goes through the capture
/// container first; WAV and MP3 are re-encoded from its decoded PCM.
pub fn export(mix: &PcmBuffer, format: ExportFormat, mp3_bitrate_kbps: u32) -> Result<Vec<u8>> {
    let container = encode_container(mix)?;
    let bytes = match format {
        ExportFormat::RawContainer => container,
        ExportFormat::Wav => encode_wav(&decode_container(&container)?)?,
        ExportFormat::Mp3 => encode_mp3(&decode_container(&container)?, mp3_bitrate_kbps)?,
    };
    log::info!("exported {} ({} bytes)", format.file_name(), bytes.len());
    Ok(bytes)
}
