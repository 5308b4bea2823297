#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use stepgrid::audio::PcmBuffer;
use stepgrid::{AudioHost, Clock, EngineConfig, PlaybackRequest, SequencerEngine};

/// Host whose clock the test sets by hand. Keeps every request.
pub struct ManualHost {
    pub now: Rc<Cell<Option<f64>>>,
    pub requests: Vec<PlaybackRequest>,
}

impl Clock for ManualHost {
    fn now(&self) -> Option<f64> {
        self.now.get()
    }
}

impl AudioHost for ManualHost {
    fn schedule_playback(&mut self, request: PlaybackRequest) {
        self.requests.push(request);
    }

    fn sample_rate(&self) -> u32 {
        44100
    }
}

pub fn engine(start: f64, config: EngineConfig) -> (SequencerEngine<ManualHost>, Rc<Cell<Option<f64>>>) {
    let now = Rc::new(Cell::new(Some(start)));
    let host = ManualHost { now: Rc::clone(&now), requests: Vec::new() };
    (SequencerEngine::new(host, config).unwrap(), now)
}

pub fn click(sample_rate: u32, frames: usize) -> Arc<PcmBuffer> {
    Arc::new(PcmBuffer::mono(sample_rate, vec![0.5; frames]).unwrap())
}
