use std::sync::Arc;

use crate::audio::PcmBuffer;

// One grid row: its recorded sound and its robot toggle
#[derive(Clone, Debug, Default)]
pub struct Track {
    sample: Option<Arc<PcmBuffer>>, // None until the first recording lands
    effect_mode: bool,
}

impl Track {
    pub fn sample(&self) -> Option<&Arc<PcmBuffer>> {
        self.sample.as_ref()
    }

    pub fn has_sample(&self) -> bool {
        self.sample.is_some()
    }

    // Replaces any previous sample; voices already playing keep their own Arc
    pub fn set_sample(&mut self, buffer: Arc<PcmBuffer>) {
        self.sample = Some(buffer);
    }

    pub fn clear_sample(&mut self) {
        self.sample = None;
    }

    pub fn effect_mode(&self) -> bool {
        self.effect_mode
    }

    pub fn toggle_effect_mode(&mut self) -> bool {
        self.effect_mode = !self.effect_mode;
        self.effect_mode
    }
}
