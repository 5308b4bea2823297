mod common;

use std::time::Duration;

use common::engine;
use stepgrid::audio::{encode_container, PcmBuffer};
use stepgrid::{CaptureDevice, EngineConfig, EngineError, Result};

/// Hands back a fixed capture, or refuses to start like a denied microphone.
struct FakeMic {
    allowed: bool,
    capture: Vec<u8>,
    started: usize,
    stopped: usize,
}

impl FakeMic {
    fn with(capture: Vec<u8>) -> Self {
        Self { allowed: true, capture, started: 0, stopped: 0 }
    }
}

impl CaptureDevice for FakeMic {
    type Handle = usize;

    fn start_capture(&mut self) -> Result<usize> {
        if !self.allowed {
            return Err(EngineError::PermissionDenied("user said no".into()));
        }
        self.started += 1;
        Ok(self.started)
    }

    fn stop_capture(&mut self, _handle: usize) -> Result<Vec<u8>> {
        self.stopped += 1;
        Ok(self.capture.clone())
    }
}

fn voice() -> PcmBuffer {
    PcmBuffer::mono(48000, (0..480).map(|i| (i as f32 / 480.0) - 0.5).collect()).unwrap()
}

#[test]
fn recorded_sample_plays_on_its_track() {
    let (mut engine, now) = engine(0.0, EngineConfig::default());
    let mut mic = FakeMic::with(encode_container(&voice()).unwrap());

    let pending = engine.arm_recording(2, &mut mic).unwrap();
    let buffer = engine.finish_recording(pending, &mut mic).unwrap();
    assert_eq!(*buffer, voice());
    assert_eq!((mic.started, mic.stopped), (1, 1));

    engine.toggle_step(2, 1).unwrap();
    engine.start().unwrap();
    now.set(Some(0.2));
    engine.tick();
    let request = &engine.host().requests[0];
    assert_eq!(request.track, 2);
    assert_eq!(request.start_time, 0.25);
    assert_eq!(request.buffer.num_frames(), 480);
}

#[test]
fn denied_microphone_aborts_the_recording() {
    let (engine, _now) = engine(0.0, EngineConfig::default());
    let mut mic = FakeMic { allowed: false, ..FakeMic::with(Vec::new()) };
    let result = engine.arm_recording(0, &mut mic);
    assert!(matches!(result, Err(EngineError::PermissionDenied(_))));
    assert!(!engine.track(0).unwrap().has_sample());
}

#[test]
fn undecodable_capture_is_reported() {
    let (mut engine, _now) = engine(0.0, EngineConfig::default());
    let mut mic = FakeMic::with(vec![0u8; 64]);
    let pending = engine.arm_recording(1, &mut mic).unwrap();
    let err = engine.finish_recording(pending, &mut mic).unwrap_err();
    assert!(matches!(err, EngineError::DecodeFailure(_)));
    assert!(!engine.track(1).unwrap().has_sample());
}

#[test]
fn recording_comes_due_after_the_configured_limit() {
    let config = EngineConfig { max_record_secs: 0.01, ..EngineConfig::default() };
    let (engine, _now) = engine(0.0, config);
    let mut mic = FakeMic::with(Vec::new());
    let pending = engine.arm_recording(0, &mut mic).unwrap();
    std::thread::sleep(Duration::from_millis(20));
    assert!(pending.is_due());
}

#[test]
fn second_recording_replaces_the_first() {
    let (mut engine, _now) = engine(0.0, EngineConfig::default());
    let mut mic = FakeMic::with(encode_container(&voice()).unwrap());
    let first = engine.arm_recording(3, &mut mic).unwrap();
    engine.finish_recording(first, &mut mic).unwrap();

    mic.capture = encode_container(&PcmBuffer::mono(48000, vec![0.0; 10]).unwrap()).unwrap();
    let second = engine.arm_recording(3, &mut mic).unwrap();
    engine.finish_recording(second, &mut mic).unwrap();
    assert_eq!(engine.track(3).unwrap().sample().unwrap().num_frames(), 10);
}
