use std::time::{Duration, Instant};

/// A capture in progress for one track.
///
/// Hand it back to `SequencerEngine::finish_recording` to get the decoded
/// sample; that consumes it, so a recording completes at most once. Dropping
/// it instead abandons the capture.
#[derive(Debug)]
pub struct PendingRecording<H> {
    track: usize,
    handle: H,
    started: Instant,
    max_duration: Duration,
}

impl<H> PendingRecording<H> {
    pub(crate) fn new(track: usize, handle: H, max_duration: Duration) -> Self {
        Self {
            track,
            handle,
            started: Instant::now(),
            max_duration,
        }
    }

    pub fn track(&self) -> usize {
        self.track
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once the capture has run for its maximum length and should be
    /// finished even if nobody pressed stop.
    pub fn is_due(&self) -> bool {
        self.elapsed() >= self.max_duration
    }

    pub(crate) fn into_parts(self) -> (usize, H) {
        (self.track, self.handle)
    }
}
