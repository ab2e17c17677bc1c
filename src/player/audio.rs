use anyhow::{Context as _, Result};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::sync::Arc;
use std::time::Duration;

use super::clock::PlaybackClock;
use super::sample_ring::SampleRing;

/// Samples handed out between clock updates.
const CLOCK_BATCH: u64 = 256;

/// Endless rodio source that plays the decoder's sample ring one
/// interleaved frame at a time.
///
/// The clock follows what the device plays, not what the decoder produced.
/// When the ring runs dry (slow decoder, or an audio track shorter than the
/// video) the feed plays silence and that silence still counts as time.
pub struct DeviceFeed {
    ring: Arc<SampleRing>,
    clock: PlaybackClock,
    sample_rate: u32,
    frame: Vec<f32>,
    next: usize,
    uncounted: u64,
}

impl DeviceFeed {
    pub fn new(ring: Arc<SampleRing>, clock: PlaybackClock, sample_rate: u32, channels: u16) -> Self {
        let width = channels.max(1) as usize;
        Self {
            ring,
            clock,
            sample_rate,
            frame: vec![0.0; width],
            next: width,
            uncounted: 0,
        }
    }

    /// Loads the next frame, honouring a pending flush first so a jump never
    /// splits a frame.
    fn refill(&mut self) {
        if self.clock.take_flush_request() {
            self.ring.clear();
            self.uncounted = 0;
        }
        if !self.ring.pop_frame(&mut self.frame) {
            self.frame.fill(0.0);
        }
        self.next = 0;

        self.uncounted += self.frame.len() as u64;
        if self.uncounted >= CLOCK_BATCH {
            self.clock.advance(self.uncounted);
            self.uncounted = 0;
        }
    }
}

impl Iterator for DeviceFeed {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.next == self.frame.len() {
            self.refill();
        }
        let sample = self.frame[self.next];
        self.next += 1;
        Some(sample)
    }
}

impl Source for DeviceFeed {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.frame.len() as u16
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// The default output device and the sink playing one [`DeviceFeed`].
pub struct AudioOutput {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl AudioOutput {
    /// Opens the default device with a paused, empty sink.
    pub fn open(gain: f32) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default().context("no audio output device")?;
        let sink = Sink::try_new(&handle).context("cannot create audio sink")?;
        sink.set_volume(gain);
        sink.pause();
        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }

    pub fn attach(&self, feed: DeviceFeed) {
        self.sink.append(feed);
    }

    pub fn play(&self) {
        self.sink.play();
    }

    pub fn pause(&self) {
        self.sink.pause();
    }

    pub fn set_gain(&self, gain: f32) {
        self.sink.set_volume(gain);
    }
}
