use super::decoder::DecodedFrame;
use super::video::FrameQueue;

/// The clock counts as finished this close to the end (ms).
const END_TOLERANCE_MS: u64 = 100;

/// What one pump of the pipeline should do.
#[derive(Default)]
pub struct Step {
    /// Frame to put on screen.
    pub frame: Option<DecodedFrame>,
    /// A pending seek settled; output may resume.
    pub landed: bool,
    /// The first seek after opening settled, so the media is loaded.
    pub loaded: bool,
    /// Playback ran off the end.
    pub ended: bool,
}

/// Seek, end-of-stream and end-of-media bookkeeping for one open source.
///
/// Holds no clock or device; the engine feeds it the clock reading and acts
/// on the returned [`Step`].
#[derive(Debug)]
pub struct PlayCursor {
    duration_ms: u64,
    seek_target: Option<u64>,
    reached_eof: bool,
    loaded: bool,
}

impl PlayCursor {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            seek_target: None,
            reached_eof: false,
            loaded: false,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Starts a seek and returns the target, clamped to the duration once
    /// that is known.
    pub fn begin_seek(&mut self, target_ms: u64) -> u64 {
        let target = if self.duration_ms > 0 {
            target_ms.min(self.duration_ms)
        } else {
            target_ms
        };
        self.seek_target = Some(target);
        self.reached_eof = false;
        target
    }

    pub fn is_seeking(&self) -> bool {
        self.seek_target.is_some()
    }

    pub fn mark_end_of_stream(&mut self) {
        self.reached_eof = true;
    }

    /// While a seek is pending the target is the position; the clock has not
    /// caught up yet.
    pub fn position_ms(&self, clock_ms: u64) -> u64 {
        self.seek_target.unwrap_or(clock_ms)
    }

    pub fn step(&mut self, frames: &mut FrameQueue, playing: bool, clock_ms: u64) -> Step {
        let mut step = Step::default();

        if let Some(target) = self.seek_target {
            step.frame = frames.landed_after_seek(target);
            if step.frame.is_some() || self.reached_eof {
                self.seek_target = None;
                step.landed = true;
                step.loaded = !self.loaded;
                self.loaded = true;
            }
            return step;
        }

        if !playing {
            return step;
        }

        step.frame = frames.due_at(clock_ms);
        let clock_done = self.duration_ms > 0 && clock_ms + END_TOLERANCE_MS >= self.duration_ms;
        step.ended = frames.is_drained() && (self.reached_eof || clock_done);
        step
    }
}
