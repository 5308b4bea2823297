use crate::error::{EngineError, Result};
use crate::shared::{NUM_STEPS, NUM_TRACKS};

const ARMED: char = 'x';
const OFF: char = '.';

/// Which (track, step) cells fire. `Copy`, so the scheduler can take a
/// snapshot per pass and never see a half-applied edit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerTable {
    cells: [[bool; NUM_STEPS]; NUM_TRACKS],
}

impl TriggerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rows like `"x...x..."`, one per track. Missing rows stay empty.
    pub fn from_pattern<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        if rows.len() > NUM_TRACKS {
            return Err(EngineError::Config(format!(
                "pattern has {} rows, grid has {}", rows.len(), NUM_TRACKS
            )));
        }
        let mut table = Self::new();
        for (track, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != NUM_STEPS {
                return Err(EngineError::Config(format!(
                    "pattern row {} must have {} steps: {:?}", track, NUM_STEPS, row
                )));
            }
            for (step, c) in row.chars().enumerate() {
                table.cells[track][step] = match c.to_ascii_lowercase() {
                    ARMED => true,
                    OFF | '-' => false,
                    other => {
                        return Err(EngineError::Config(format!(
                            "unexpected {:?} in pattern row {}", other, track
                        )))
                    }
                };
            }
        }
        Ok(table)
    }

    pub fn to_pattern(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|&on| if on { ARMED } else { OFF }).collect())
            .collect()
    }

    /// Flip one cell and return its new state.
    pub fn toggle(&mut self, track: usize, step: usize) -> Result<bool> {
        check(track, step)?;
        let cell = &mut self.cells[track][step];
        *cell = !*cell;
        Ok(*cell)
    }

    pub fn set(&mut self, track: usize, step: usize, armed: bool) -> Result<()> {
        check(track, step)?;
        self.cells[track][step] = armed;
        Ok(())
    }

    pub fn is_armed(&self, track: usize, step: usize) -> bool {
        self.cells
            .get(track)
            .and_then(|row| row.get(step))
            .copied()
            .unwrap_or(false)
    }

    pub fn armed_tracks(&self, step: usize) -> impl Iterator<Item = usize> + '_ {
        (0..NUM_TRACKS).filter(move |&track| self.is_armed(track, step))
    }
}

fn check(track: usize, step: usize) -> Result<()> {
    if track >= NUM_TRACKS {
        return Err(EngineError::TrackOutOfRange(track));
    }
    if step >= NUM_STEPS {
        return Err(EngineError::StepOutOfRange(step));
    }
    Ok(())
}
