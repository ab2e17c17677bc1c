use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// What moves a [`PlaybackClock`] forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockDrive {
    /// Samples handed to the audio device, silence included.
    Device { sample_rate: u32, channels: u16 },
    /// Elapsed wall time while running. Used when there is nothing to hear.
    Wall,
}

/// Master clock for A/V sync. Cloned handles share the same state.
///
/// Positions are `base + progress`, where a jump resets the base and
/// progress is counted in device samples or wall time since the last jump.
#[derive(Clone)]
pub struct PlaybackClock {
    drive: ClockDrive,
    base_us: Arc<AtomicU64>,
    device_samples: Arc<AtomicU64>,
    /// Wall drive only: when the clock last began running.
    resumed_at: Arc<Mutex<Option<Instant>>>,
    running: Arc<AtomicBool>,
    flush_requested: Arc<AtomicBool>,
}

impl PlaybackClock {
    /// A clock that follows the audio device. `channels` is the interleave
    /// width of the samples later passed to [`advance`](Self::advance).
    pub fn device(sample_rate: u32, channels: u16) -> Self {
        Self::with_drive(ClockDrive::Device {
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
        })
    }

    pub fn wall() -> Self {
        Self::with_drive(ClockDrive::Wall)
    }

    fn with_drive(drive: ClockDrive) -> Self {
        Self {
            drive,
            base_us: Arc::new(AtomicU64::new(0)),
            device_samples: Arc::new(AtomicU64::new(0)),
            resumed_at: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            flush_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn drive(&self) -> ClockDrive {
        self.drive
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms_at(Instant::now())
    }

    fn position_ms_at(&self, now: Instant) -> u64 {
        self.position_us_at(now) / 1_000
    }

    fn position_us_at(&self, now: Instant) -> u64 {
        let base = self.base_us.load(Ordering::Relaxed);
        let progress = match self.drive {
            ClockDrive::Device {
                sample_rate,
                channels,
            } => {
                let per_second = sample_rate as u64 * channels as u64;
                self.device_samples
                    .load(Ordering::Relaxed)
                    .saturating_mul(1_000_000)
                    / per_second
            }
            ClockDrive::Wall => self
                .resumed_at
                .lock()
                .map_or(0, |since| now.saturating_duration_since(since).as_micros() as u64),
        };
        base.saturating_add(progress)
    }

    /// Jump to `ms` and ask the audio feed to drop whatever it buffered for
    /// the old position.
    pub fn jump_to_ms(&self, ms: u64) {
        self.reposition_at(ms, Instant::now());
        self.flush_requested.store(true, Ordering::Relaxed);
    }

    fn reposition_at(&self, ms: u64, now: Instant) {
        self.device_samples.store(0, Ordering::Relaxed);
        self.base_us.store(ms.saturating_mul(1_000), Ordering::Relaxed);
        let mut resumed_at = self.resumed_at.lock();
        if resumed_at.is_some() {
            *resumed_at = Some(now);
        }
    }

    pub fn take_flush_request(&self) -> bool {
        self.flush_requested.swap(false, Ordering::Relaxed)
    }

    /// Counts `samples` interleaved values as played. Ignored unless the
    /// clock is running on the device drive.
    pub fn advance(&self, samples: u64) {
        if matches!(self.drive, ClockDrive::Device { .. }) && self.is_running() {
            self.device_samples.fetch_add(samples, Ordering::Relaxed);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn start(&self) {
        self.start_at(Instant::now());
    }

    fn start_at(&self, now: Instant) {
        if self.running.swap(true, Ordering::Relaxed) {
            return;
        }
        if self.drive == ClockDrive::Wall {
            *self.resumed_at.lock() = Some(now);
        }
    }

    pub fn halt(&self) {
        self.halt_at(Instant::now());
    }

    fn halt_at(&self, now: Instant) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }
        if self.drive == ClockDrive::Wall {
            let reached = self.position_us_at(now);
            *self.resumed_at.lock() = None;
            self.base_us.store(reached, Ordering::Relaxed);
        }
    }
}
