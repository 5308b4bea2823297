// Engine settings, read from the project directory on startup.
// A missing file just means defaults; a broken one is reported.
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::encode::SUPPORTED_BITRATES;
use crate::error::{EngineError, Result};
use crate::pipeline::effects::{DEFAULT_CURVE_SAMPLES, ROBOT_AMOUNT};
use crate::pipeline::scheduler::{check_tempo, DEFAULT_SCHEDULE_AHEAD};
use crate::pipeline::TriggerTable;

const STEPGRID_DIR: &str = ".stepgrid";
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tempo_bpm: f64,
    pub tick_interval_ms: u64,     // how often the driver is expected to tick
    pub schedule_ahead_secs: f64,  // lookahead window
    pub loop_count: u32,           // loops per export
    pub tail_secs: f64,            // extra render time after the last loop
    pub render_sample_rate: u32,
    pub render_channels: u16,
    pub distortion_amount: f64,
    pub curve_samples: usize,
    pub max_record_secs: f64,      // recordings stop on their own after this
    pub master_gain: f32,
    pub mp3_bitrate_kbps: u32,

    // optional starting grid, one "x...x..." row per track
    pub pattern: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            tick_interval_ms: 25,
            schedule_ahead_secs: DEFAULT_SCHEDULE_AHEAD,
            loop_count: 4,
            tail_secs: 0.5,
            render_sample_rate: 44100,
            render_channels: 2,
            distortion_amount: ROBOT_AMOUNT,
            curve_samples: DEFAULT_CURVE_SAMPLES,
            max_record_secs: 2.0,
            master_gain: 1.0,
            mp3_bitrate_kbps: 128,
            pattern: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn max_record_duration(&self) -> Duration {
        Duration::from_secs_f64(self.max_record_secs)
    }

    pub fn initial_grid(&self) -> Result<TriggerTable> {
        TriggerTable::from_pattern(&self.pattern)
    }

    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(EngineError::Config(msg));
        check_tempo(self.tempo_bpm)?;
        if self.tick_interval_ms == 0 {
            return bad("tick_interval_ms must be at least 1".into());
        }
        if !(self.schedule_ahead_secs.is_finite() && self.schedule_ahead_secs >= 0.0) {
            return bad(format!("schedule_ahead_secs must be >= 0, got {}", self.schedule_ahead_secs));
        }
        if self.loop_count == 0 {
            return bad("loop_count must be at least 1".into());
        }
        if !(self.tail_secs.is_finite() && self.tail_secs >= 0.0) {
            return bad(format!("tail_secs must be >= 0, got {}", self.tail_secs));
        }
        if self.render_sample_rate == 0 || self.render_channels == 0 {
            return bad("render_sample_rate and render_channels must be positive".into());
        }
        if !self.distortion_amount.is_finite() || self.distortion_amount < 0.0 {
            return bad(format!("distortion_amount must be >= 0, got {}", self.distortion_amount));
        }
        if self.curve_samples < 2 {
            return bad("curve_samples must be at least 2".into());
        }
        if !(self.max_record_secs.is_finite() && self.max_record_secs > 0.0) {
            return bad(format!("max_record_secs must be positive, got {}", self.max_record_secs));
        }
        if !(self.master_gain.is_finite() && self.master_gain >= 0.0) {
            return bad(format!("master_gain must be >= 0, got {}", self.master_gain));
        }
        if !SUPPORTED_BITRATES.contains(&self.mp3_bitrate_kbps) {
            return bad(format!("mp3_bitrate_kbps {} not one of {:?}", self.mp3_bitrate_kbps, SUPPORTED_BITRATES));
        }
        self.initial_grid().map(|_| ())
    }
}

// <project_dir>/.stepgrid/config.json
pub fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(STEPGRID_DIR).join(CONFIG_FILE)
}

pub fn load_config(project_dir: &Path) -> Result<EngineConfig> {
    let path = config_file_path(project_dir);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(EngineConfig::default()),
        Err(e) => return Err(e.into()),
    };
    let config: EngineConfig = serde_json::from_str(&data)
        .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

// Save the config, making the directory if it doesn't exist already
pub fn save_config(project_dir: &Path, config: &EngineConfig) -> Result<()> {
    let path = config_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?; // create .stepgrid/ if needed
    }
    let json = serde_json::to_string_pretty(config).map_err(|e| EngineError::Config(e.to_string()))?;
    std::fs::write(&path, json)?;
    Ok(())
}
