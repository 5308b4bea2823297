//! The control-side engine: grid, tracks, transport and recording, wired to
//! one audio host.
//!
//! Everything here runs on the caller's thread through `&mut self`. The
//! caller drives time by calling [`SequencerEngine::tick`] roughly every
//! [`SequencerEngine::tick_interval`]; nothing in here sleeps.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::audio::{decode_container, PcmBuffer};
use crate::audio_api::{AudioHost, CaptureDevice};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::loader;
use crate::shared::NUM_TRACKS;

use super::dispatcher::PlaybackDispatcher;
use super::effects::distortion_curve;
use super::export::{export, ExportFormat, RenderJob};
use super::recording::PendingRecording;
use super::scheduler::LookaheadScheduler;
use super::track::Track;
use super::trigger_table::TriggerTable;

pub struct SequencerEngine<H: AudioHost> {
    config: EngineConfig,
    grid: TriggerTable,
    tracks: [Track; NUM_TRACKS],
    scheduler: LookaheadScheduler,
    dispatcher: PlaybackDispatcher,
    host: H,
}

impl<H: AudioHost> SequencerEngine<H> {
    pub fn new(host: H, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let grid = config.initial_grid()?;
        let scheduler = LookaheadScheduler::new(config.tempo_bpm, config.schedule_ahead_secs)?;
        let dispatcher = PlaybackDispatcher::new(distortion_curve(config.distortion_amount, config.curve_samples));
        Ok(Self {
            config,
            grid,
            tracks: Default::default(),
            scheduler,
            dispatcher,
            host,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &TriggerTable {
        &self.grid
    }

    pub fn tick_interval(&self) -> Duration {
        self.config.tick_interval()
    }

    // ---- grid and tracks ----

    /// Flip one cell. Returns whether it is armed now. Takes effect from the
    /// next scheduling pass.
    pub fn toggle_step(&mut self, track: usize, step: usize) -> Result<bool> {
        self.grid.toggle(track, step)
    }

    pub fn track(&self, index: usize) -> Result<&Track> {
        self.tracks.get(index).ok_or(EngineError::TrackOutOfRange(index))
    }

    fn track_mut(&mut self, index: usize) -> Result<&mut Track> {
        self.tracks.get_mut(index).ok_or(EngineError::TrackOutOfRange(index))
    }

    pub fn set_track_sample(&mut self, track: usize, buffer: Arc<PcmBuffer>) -> Result<()> {
        self.track_mut(track)?.set_sample(buffer);
        Ok(())
    }

    pub fn clear_track_sample(&mut self, track: usize) -> Result<()> {
        self.track_mut(track)?.clear_sample();
        Ok(())
    }

    pub fn toggle_effect_mode(&mut self, track: usize) -> Result<bool> {
        let on = self.track_mut(track)?.toggle_effect_mode();
        log::debug!("track {} robot mode {}", track, if on { "on" } else { "off" });
        Ok(on)
    }

    /// Load the sorted `.wav` files of `dir` into tracks 0.. in order. Files
    /// past the last track are ignored. Returns how many tracks got a sample.
    pub fn load_samples_from_dir(&mut self, dir: &Path) -> Result<usize> {
        let paths = loader::index_wav_in_dir(dir)?;
        if paths.len() > NUM_TRACKS {
            log::warn!("{} samples in {}, only the first {} are used", paths.len(), dir.display(), NUM_TRACKS);
        }
        let mut loaded = 0;
        for (track, path) in paths.iter().take(NUM_TRACKS).enumerate() {
            let buffer = loader::load(path)?;
            self.tracks[track].set_sample(buffer);
            loaded += 1;
        }
        log::info!("loaded {} samples from {}", loaded, dir.display());
        Ok(loaded)
    }

    // ---- transport ----

    pub fn set_tempo(&mut self, bpm: f64) -> Result<()> {
        self.scheduler.set_tempo(bpm)?;
        log::info!("tempo {} bpm", bpm);
        Ok(())
    }

    pub fn tempo(&self) -> f64 {
        self.scheduler.tempo()
    }

    /// Start from step 0 at the host's current time and schedule the first
    /// window right away. Does nothing if already playing.
    pub fn start(&mut self) -> Result<()> {
        if self.scheduler.is_running() {
            return Ok(());
        }
        self.scheduler.start(&self.host)?;
        log::info!("transport started at {} bpm", self.scheduler.tempo());
        self.tick();
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.scheduler.is_running() {
            log::info!("transport stopped");
        }
        self.scheduler.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn current_step(&self) -> usize {
        self.scheduler.current_step()
    }

    /// One scheduling pass. Returns how many steps were scheduled.
    pub fn tick(&mut self) -> usize {
        if !self.scheduler.is_running() {
            return 0;
        }
        let Some(now) = self.host.now() else {
            log::warn!("audio clock unreadable, skipping tick");
            return 0;
        };

        let Self { grid, tracks, scheduler, dispatcher, host, .. } = self;
        let grid = *grid;
        scheduler.tick(now, |event| {
            dispatcher.dispatch(event, &grid, &tracks[..], &mut *host);
        })
    }

    // ---- recording ----

    pub fn arm_recording<C: CaptureDevice>(
        &self,
        track: usize,
        device: &mut C,
    ) -> Result<PendingRecording<C::Handle>> {
        self.track(track)?;
        let handle = device.start_capture()?;
        log::info!("recording into track {}", track);
        Ok(PendingRecording::new(track, handle, self.config.max_record_duration()))
    }

    /// Stop the capture, decode it and put it on the recording's track. A
    /// capture that can't be decoded leaves the track as it was.
    pub fn finish_recording<C: CaptureDevice>(
        &mut self,
        pending: PendingRecording<C::Handle>,
        device: &mut C,
    ) -> Result<Arc<PcmBuffer>> {
        let (track, handle) = pending.into_parts();
        let bytes = device.stop_capture(handle)?;
        let buffer = Arc::new(decode_container(&bytes)?);
        log::info!("track {} recorded {:.2}s", track, buffer.duration_secs());
        self.set_track_sample(track, Arc::clone(&buffer))?;
        Ok(buffer)
    }

    // ---- export ----

    /// Render `loop_count` loops of the current grid (plus the tail) offline.
    pub fn render_mix(&self) -> Result<PcmBuffer> {
        RenderJob {
            grid: self.grid,
            tracks: &self.tracks,
            dispatcher: &self.dispatcher,
            config: &self.config,
            tempo_bpm: self.scheduler.tempo(),
        }
        .render()
    }

    /// Stop live playback, bounce offline and encode. Returns the file bytes.
    pub fn render_and_export(&mut self, format: ExportFormat) -> Result<Vec<u8>> {
        self.stop();
        let mix = self.render_mix()?;
        export(&mix, format, self.config.mp3_bitrate_kbps)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::audio::encode_container;
    use crate::audio_api::{Clock, PlaybackRequest};

    // Records every request; the test moves the clock by hand.
    struct StubHost {
        now: Rc<Cell<Option<f64>>>,
        requests: Vec<PlaybackRequest>,
    }

    impl Clock for StubHost {
        fn now(&self) -> Option<f64> {
            self.now.get()
        }
    }

    impl AudioHost for StubHost {
        fn schedule_playback(&mut self, request: PlaybackRequest) {
            self.requests.push(request);
        }

        fn sample_rate(&self) -> u32 {
            44100
        }
    }

    struct StubMic {
        bytes: Result<Vec<u8>>,
    }

    impl CaptureDevice for StubMic {
        type Handle = ();

        fn start_capture(&mut self) -> Result<()> {
            Ok(())
        }

        fn stop_capture(&mut self, _handle: ()) -> Result<Vec<u8>> {
            std::mem::replace(&mut self.bytes, Ok(Vec::new()))
        }
    }

    fn engine_at(t: f64) -> (SequencerEngine<StubHost>, Rc<Cell<Option<f64>>>) {
        let clock = Rc::new(Cell::new(Some(t)));
        let host = StubHost { now: Rc::clone(&clock), requests: Vec::new() };
        (SequencerEngine::new(host, EngineConfig::default()).unwrap(), clock)
    }

    fn kick() -> Arc<PcmBuffer> {
        Arc::new(PcmBuffer::mono(44100, vec![0.5; 100]).unwrap())
    }

    fn fired(engine: &SequencerEngine<StubHost>) -> Vec<(usize, f64)> {
        engine.host().requests.iter().map(|r| (r.track, r.start_time)).collect()
    }

    #[test]
    fn two_beat_pattern_fires_on_the_beat() {
        let (mut engine, clock) = engine_at(10.0);
        engine.toggle_step(0, 0).unwrap();
        engine.toggle_step(0, 4).unwrap();
        engine.set_track_sample(0, kick()).unwrap();

        engine.start().unwrap();
        let mut t = 10.0;
        while t < 12.05 {
            clock.set(Some(t));
            engine.tick();
            t += 0.025;
        }
        let times: Vec<f64> = fired(&engine).iter().map(|&(_, time)| time).collect();
        assert_eq!(times, vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn start_schedules_step_zero_immediately() {
        let (mut engine, _clock) = engine_at(3.0);
        engine.toggle_step(1, 0).unwrap();
        engine.set_track_sample(1, kick()).unwrap();
        engine.start().unwrap();
        assert_eq!(fired(&engine), vec![(1, 3.0)]);
        assert_eq!(engine.current_step(), 1);
    }

    #[test]
    fn grid_edits_show_up_on_the_next_pass() {
        let (mut engine, clock) = engine_at(0.0);
        engine.set_track_sample(2, kick()).unwrap();
        engine.start().unwrap();
        assert!(fired(&engine).is_empty());

        engine.toggle_step(2, 1).unwrap();
        clock.set(Some(0.2));
        engine.tick();
        assert_eq!(fired(&engine), vec![(2, 0.25)]);
    }

    #[test]
    fn unreadable_clock_fails_start_and_skips_ticks() {
        let (mut engine, clock) = engine_at(0.0);
        clock.set(None);
        assert!(matches!(engine.start(), Err(EngineError::ClockUnavailable)));
        assert!(!engine.is_playing());

        clock.set(Some(0.0));
        engine.start().unwrap();
        clock.set(None);
        assert_eq!(engine.tick(), 0);
    }

    #[test]
    fn stop_silences_later_ticks() {
        let (mut engine, clock) = engine_at(0.0);
        engine.toggle_step(0, 0).unwrap();
        engine.toggle_step(0, 1).unwrap();
        engine.set_track_sample(0, kick()).unwrap();
        engine.start().unwrap();
        engine.stop();
        clock.set(Some(5.0));
        assert_eq!(engine.tick(), 0);
        assert_eq!(fired(&engine).len(), 1);
    }

    #[test]
    fn toggling_twice_restores_the_grid() {
        let (mut engine, _clock) = engine_at(0.0);
        let before = *engine.grid();
        assert!(engine.toggle_step(5, 7).unwrap());
        assert!(!engine.toggle_step(5, 7).unwrap());
        assert_eq!(*engine.grid(), before);
        assert!(matches!(engine.toggle_step(6, 0), Err(EngineError::TrackOutOfRange(6))));
    }

    #[test]
    fn cleared_track_goes_quiet() {
        let (mut engine, _clock) = engine_at(0.0);
        engine.toggle_step(0, 0).unwrap();
        engine.set_track_sample(0, kick()).unwrap();
        engine.clear_track_sample(0).unwrap();
        engine.start().unwrap();
        assert!(fired(&engine).is_empty());
    }

    #[test]
    fn effect_mode_adds_the_waveshaper() {
        let (mut engine, _clock) = engine_at(0.0);
        engine.toggle_step(3, 0).unwrap();
        engine.set_track_sample(3, kick()).unwrap();
        assert!(engine.toggle_effect_mode(3).unwrap());
        engine.start().unwrap();
        assert!(engine.host().requests[0].effect.is_some());
    }

    #[test]
    fn finished_recording_lands_on_its_track() {
        let (mut engine, _clock) = engine_at(0.0);
        let captured = PcmBuffer::mono(48000, vec![0.1, -0.1, 0.2]).unwrap();
        let mut mic = StubMic { bytes: Ok(encode_container(&captured).unwrap()) };

        let pending = engine.arm_recording(4, &mut mic).unwrap();
        assert_eq!(pending.track(), 4);
        let buffer = engine.finish_recording(pending, &mut mic).unwrap();
        assert_eq!(*buffer, captured);
        assert!(engine.track(4).unwrap().has_sample());
    }

    #[test]
    fn undecodable_capture_keeps_the_old_sample() {
        let (mut engine, _clock) = engine_at(0.0);
        engine.set_track_sample(0, kick()).unwrap();
        let mut mic = StubMic { bytes: Ok(b"garbage".to_vec()) };
        let pending = engine.arm_recording(0, &mut mic).unwrap();
        let err = engine.finish_recording(pending, &mut mic).unwrap_err();
        assert!(matches!(err, EngineError::DecodeFailure(_)));
        assert_eq!(engine.track(0).unwrap().sample().unwrap().num_frames(), 100);
    }

    #[test]
    fn recording_into_a_missing_track_is_refused() {
        let (engine, _clock) = engine_at(0.0);
        let mut mic = StubMic { bytes: Ok(Vec::new()) };
        assert!(matches!(engine.arm_recording(9, &mut mic), Err(EngineError::TrackOutOfRange(9))));
    }

    #[test]
    fn export_stops_playback_and_has_loop_length() {
        let (mut engine, _clock) = engine_at(0.0);
        engine.toggle_step(0, 0).unwrap();
        engine.set_track_sample(0, kick()).unwrap();
        engine.start().unwrap();

        let wav = engine.render_and_export(ExportFormat::Wav).unwrap();
        assert!(!engine.is_playing());
        // 4 loops of 8 steps at 120 bpm = 8 s, plus 0.5 s tail, stereo 16-bit
        assert_eq!(wav.len(), 44 + 44100 * 17 / 2 * 2 * 2);
    }

    #[test]
    fn offline_mix_contains_each_loop_downbeat() {
        let (mut engine, _clock) = engine_at(0.0);
        engine.toggle_step(0, 0).unwrap();
        engine.set_track_sample(0, kick()).unwrap();
        let mix = engine.render_mix().unwrap();
        let left = mix.channel(0).unwrap();
        for loop_start in [0, 88200, 176400, 264600] {
            assert!(left[loop_start + 10] > 0.1, "no hit at frame {}", loop_start);
        }
        assert_eq!(left[44100], 0.0);
    }
}
