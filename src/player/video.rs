use crossbeam_channel::Receiver;
use std::collections::VecDeque;

use super::decoder::DecodedFrame;

/// Frames this far behind the clock are dropped (ms).
const LATE_MS: u64 = 20;
/// Frames up to this far ahead of the clock are shown early (ms).
const EARLY_MS: u64 = 20;
/// After a seek the decoder lands on the preceding keyframe; frames further
/// than this before the target are skipped.
const SEEK_SLACK_MS: u64 = 500;

/// Buffers decoded frames and hands out the one that matches the clock.
pub struct FrameQueue {
    incoming: Receiver<DecodedFrame>,
    buffered: VecDeque<DecodedFrame>,
    limit: usize,
}

impl FrameQueue {
    pub fn new(incoming: Receiver<DecodedFrame>, limit: usize) -> Self {
        Self {
            incoming,
            buffered: VecDeque::with_capacity(limit),
            limit,
        }
    }

    fn fill(&mut self) {
        while self.buffered.len() < self.limit {
            match self.incoming.try_recv() {
                Ok(frame) => self.buffered.push_back(frame),
                Err(_) => break,
            }
        }
    }

    /// Returns the frame due at `clock_ms`, if a new one is due. Late frames
    /// are discarded on the way.
    pub fn due_at(&mut self, clock_ms: u64) -> Option<DecodedFrame> {
        self.fill();

        while self
            .buffered
            .front()
            .is_some_and(|f| f.pts_ms + LATE_MS < clock_ms)
        {
            self.buffered.pop_front();
        }

        if self
            .buffered
            .front()
            .is_some_and(|f| f.pts_ms <= clock_ms + EARLY_MS)
        {
            return self.buffered.pop_front();
        }
        None
    }

    /// First frame at or near `target_ms` after a seek.
    pub fn landed_after_seek(&mut self, target_ms: u64) -> Option<DecodedFrame> {
        self.fill();

        while self
            .buffered
            .front()
            .is_some_and(|f| f.pts_ms + SEEK_SLACK_MS < target_ms)
        {
            self.buffered.pop_front();
        }
        self.buffered.pop_front()
    }

    pub fn clear(&mut self) {
        self.buffered.clear();
        while self.incoming.try_recv().is_ok() {}
    }

    pub fn is_drained(&self) -> bool {
        self.buffered.is_empty() && self.incoming.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn frame(pts_ms: u64) -> DecodedFrame {
        DecodedFrame {
            rgba: vec![0; 4],
            width: 1,
            height: 1,
            pts_ms,
        }
    }

    #[test]
    fn holds_frames_until_due() {
        let (tx, rx) = unbounded();
        let mut queue = FrameQueue::new(rx, 8);
        tx.send(frame(1_000)).unwrap();
        assert!(queue.due_at(500).is_none());
        assert_eq!(queue.due_at(990).map(|f| f.pts_ms), Some(1_000));
    }

    #[test]
    fn drops_late_frames() {
        let (tx, rx) = unbounded();
        let mut queue = FrameQueue::new(rx, 8);
        for pts in [0, 40, 80, 120] {
            tx.send(frame(pts)).unwrap();
        }
        assert_eq!(queue.due_at(110).map(|f| f.pts_ms), Some(120));
        assert!(queue.is_drained());
    }

    #[test]
    fn seek_skips_frames_before_keyframe_slack() {
        let (tx, rx) = unbounded();
        let mut queue = FrameQueue::new(rx, 8);
        for pts in [8_000, 9_200, 9_800] {
            tx.send(frame(pts)).unwrap();
        }
        assert_eq!(queue.landed_after_seek(10_000).map(|f| f.pts_ms), Some(9_800));
    }

    #[test]
    fn clear_drains_channel() {
        let (tx, rx) = unbounded();
        let mut queue = FrameQueue::new(rx, 1);
        tx.send(frame(0)).unwrap();
        tx.send(frame(40)).unwrap();
        queue.clear();
        assert!(queue.is_drained());
    }
}
