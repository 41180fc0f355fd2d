//! Speech segment buffer
//!
//! Accumulates inbound audio frames between voice-activity boundaries.
//! While idle the buffer keeps only a small trailing pre-roll window;
//! the VAD reports start-of-speech a few frames late, and the pre-roll
//! recovers the onset it missed.

use std::collections::VecDeque;

use call_agent_core::{AudioFrame, SpeechSegment};

/// Frame accumulator with a bounded pre-roll window
#[derive(Debug)]
pub struct SegmentBuffer {
    frames: VecDeque<AudioFrame>,
    pre_roll_frames: usize,
    /// True between a start-of-speech and end-of-speech boundary
    accumulating: bool,
}

impl SegmentBuffer {
    pub fn new(pre_roll_frames: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            pre_roll_frames,
            accumulating: false,
        }
    }

    /// Push one inbound frame
    ///
    /// Outside active speech only the trailing pre-roll window is
    /// retained; during speech every frame is kept in order.
    pub fn push(&mut self, frame: AudioFrame) {
        self.frames.push_back(frame);
        if !self.accumulating {
            while self.frames.len() > self.pre_roll_frames {
                self.frames.pop_front();
            }
        }
    }

    /// Start-of-speech boundary: truncate to the pre-roll window and
    /// begin accumulating
    pub fn begin_speech(&mut self) {
        while self.frames.len() > self.pre_roll_frames {
            self.frames.pop_front();
        }
        self.accumulating = true;
    }

    /// End-of-speech boundary: hand off the accumulated frames
    ///
    /// Returns `None` when nothing was buffered (a no-op, not an
    /// error). The buffer is cleared either way, ready for the next
    /// segment.
    pub fn finish_speech(&mut self) -> Option<SpeechSegment> {
        self.accumulating = false;
        let frames: Vec<AudioFrame> = self.frames.drain(..).collect();
        SpeechSegment::from_frames(frames)
    }

    /// Drop everything buffered so far
    pub fn clear(&mut self) {
        self.accumulating = false;
        self.frames.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_agent_core::{Channels, SampleRate};

    fn frame(ts: u64) -> AudioFrame {
        AudioFrame::new(vec![1i16; 160], SampleRate::Hz16000, Channels::Mono, ts)
    }

    #[test]
    fn test_pre_roll_window_bounds_idle_buffer() {
        let mut buffer = SegmentBuffer::new(3);
        for ts in 0..10 {
            buffer.push(frame(ts * 10));
        }
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_accumulates_during_speech() {
        let mut buffer = SegmentBuffer::new(3);
        buffer.begin_speech();
        for ts in 0..10 {
            buffer.push(frame(ts * 10));
        }
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn test_begin_speech_keeps_pre_roll() {
        let mut buffer = SegmentBuffer::new(2);
        for ts in 0..5 {
            buffer.push(frame(ts * 10));
        }
        buffer.begin_speech();
        buffer.push(frame(50));

        let segment = buffer.finish_speech().unwrap();
        // 2 pre-roll frames + 1 speech frame
        assert_eq!(segment.started_at_ms, 30);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_finish_with_empty_buffer_is_noop() {
        let mut buffer = SegmentBuffer::new(3);
        buffer.begin_speech();
        assert!(buffer.finish_speech().is_none());
    }

    #[test]
    fn test_cleared_after_finalize() {
        let mut buffer = SegmentBuffer::new(3);
        buffer.begin_speech();
        buffer.push(frame(0));
        assert!(buffer.finish_speech().is_some());
        assert!(buffer.finish_speech().is_none());
    }
}
