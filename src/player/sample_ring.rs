use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Interleaved f32 samples shared between the decoder thread (producer)
/// and the audio feed (consumer).
///
/// Writers never block: once `capacity` is reached the oldest samples are
/// discarded, which keeps the decoder from stalling behind a paused sink.
/// Discards happen in whole frames of `frame_len` samples so channels never
/// swap.
pub struct SampleRing {
    samples: Mutex<VecDeque<f32>>,
    capacity: usize,
    frame_len: usize,
}

impl SampleRing {
    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        Self::framed(capacity, 1)
    }

    /// Sized to hold about one second of audio.
    pub fn for_stream(sample_rate: u32, channels: u16) -> Arc<Self> {
        Self::framed(sample_rate as usize * channels as usize, channels as usize)
    }

    fn framed(capacity: usize, frame_len: usize) -> Arc<Self> {
        let frame_len = frame_len.max(1);
        let capacity = capacity.max(frame_len) / frame_len * frame_len;
        Arc::new(Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            frame_len,
        })
    }

    fn whole_frames(&self, samples: usize) -> usize {
        samples.div_ceil(self.frame_len) * self.frame_len
    }

    pub fn extend(&self, incoming: &[f32]) {
        let mut samples = self.samples.lock();
        let overflow =
            self.whole_frames((samples.len() + incoming.len()).saturating_sub(self.capacity));
        if overflow >= samples.len() {
            samples.clear();
            let skip = self.whole_frames(incoming.len().saturating_sub(self.capacity));
            samples.extend(&incoming[skip.min(incoming.len())..]);
        } else {
            samples.drain(..overflow);
            samples.extend(incoming);
        }
    }

    /// Fills `out` from the front of the ring, or takes nothing and returns
    /// false when fewer than `out.len()` samples are buffered.
    pub fn pop_frame(&self, out: &mut [f32]) -> bool {
        let mut samples = self.samples.lock();
        if samples.len() < out.len() {
            return false;
        }
        for (slot, sample) in out.iter_mut().zip(samples.drain(..out.len())) {
            *slot = sample;
        }
        true
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}
