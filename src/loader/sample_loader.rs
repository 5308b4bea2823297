use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::{PcmBuffer, CONTAINER_EXTENSION};
use crate::error::Result;

// Every .wav directly inside `dir`, sorted by file name so track order is
// stable between runs. Our own export outputs are skipped.
pub fn index_wav_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_wav(&path) || is_export_output(&path) {
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

// Load a WAV from disk, ready to hang on a track
pub fn load(path: &Path) -> Result<Arc<PcmBuffer>> {
    let buffer = PcmBuffer::load_wav(path)?;
    log::debug!(
        "loaded {} ({} Hz, {} ch, {:.2}s)",
        path.display(),
        buffer.sample_rate(),
        buffer.num_channels(),
        buffer.duration_secs()
    );
    Ok(Arc::new(buffer))
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

fn is_export_output(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name == "beat.wav" || name == format!("beat.{}", CONTAINER_EXTENSION)
}
