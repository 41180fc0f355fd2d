//! Voice activity gate
//!
//! Consumes the ordered stream of (audio frame, detector event) pairs
//! and produces finalized speech segments for classification. The gate
//! enforces the half-duplex turn discipline: a segment finalized while
//! the controller is not listening came from noise or the agent's own
//! echo and is discarded, and at most one segment is ever in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::segment_buffer::SegmentBuffer;
use call_agent_core::{AudioFrame, SpeechSegment};

/// Voice-activity detector boundary events
///
/// The detector's internal algorithm is external; only this event
/// contract is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadEvent {
    /// Start-of-speech boundary
    SpeechStart,
    /// Speech continues (implicit "continue")
    Speech,
    /// End-of-speech boundary
    SpeechEnd,
    /// No speech detected
    Silence,
}

/// Shared listening flag
///
/// Owned by the dialog controller; the gate only performs the atomic
/// take that pairs "stop listening" with segment emission, so no two
/// segments can be in flight for classification concurrently.
#[derive(Debug, Default)]
pub struct ListeningFlag(AtomicBool);

impl ListeningFlag {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(false)))
    }

    /// Controller-side: open or close the listening window
    pub fn set(&self, listening: bool) {
        self.0.store(listening, Ordering::SeqCst);
    }

    pub fn is_listening(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Gate-side: atomically claim the turn
    ///
    /// Returns true iff the flag was set, flipping it to false in the
    /// same operation.
    pub fn try_take(&self) -> bool {
        self.0
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// The gate between raw VAD events and classification
pub struct VoiceActivityGate {
    buffer: SegmentBuffer,
    listening: Arc<ListeningFlag>,
    segment_tx: mpsc::Sender<SpeechSegment>,
}

impl VoiceActivityGate {
    pub fn new(
        pre_roll_frames: usize,
        listening: Arc<ListeningFlag>,
        segment_tx: mpsc::Sender<SpeechSegment>,
    ) -> Self {
        Self {
            buffer: SegmentBuffer::new(pre_roll_frames),
            listening,
            segment_tx,
        }
    }

    /// Consume one (frame, event) pair
    ///
    /// Frames and events arrive on the same ordered stream; the frame
    /// carried with an end-of-speech event still belongs to the
    /// finished segment.
    pub fn process(&mut self, frame: AudioFrame, event: VadEvent) {
        self.buffer.push(frame);

        match event {
            VadEvent::SpeechStart => {
                tracing::debug!("User speaking");
                self.buffer.begin_speech();
            }
            VadEvent::Speech | VadEvent::Silence => {}
            VadEvent::SpeechEnd => self.finalize(),
        }
    }

    fn finalize(&mut self) {
        let Some(segment) = self.buffer.finish_speech() else {
            // End-of-speech with nothing buffered is a no-op.
            return;
        };

        if !self.listening.try_take() {
            tracing::debug!(
                duration_ms = segment.duration_ms(),
                "Discarding segment finalized outside the listening window"
            );
            return;
        }

        tracing::debug!(duration_ms = segment.duration_ms(), "Segment finalized");

        if self.segment_tx.try_send(segment).is_err() {
            // Classification is still busy; hand the turn back so the
            // controller can reopen the window.
            tracing::warn!("Segment channel full, dropping segment");
            self.listening.set(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_agent_core::{Channels, SampleRate};

    fn frame(ts: u64) -> AudioFrame {
        AudioFrame::new(vec![100i16; 480], SampleRate::Hz48000, Channels::Mono, ts)
    }

    fn gate_with_channel(
        listening: bool,
    ) -> (
        VoiceActivityGate,
        Arc<ListeningFlag>,
        mpsc::Receiver<SpeechSegment>,
    ) {
        let flag = ListeningFlag::new();
        flag.set(listening);
        let (tx, rx) = mpsc::channel(1);
        (VoiceActivityGate::new(3, flag.clone(), tx), flag, rx)
    }

    #[tokio::test]
    async fn test_segment_emitted_while_listening() {
        let (mut gate, flag, mut rx) = gate_with_channel(true);

        gate.process(frame(0), VadEvent::SpeechStart);
        gate.process(frame(10), VadEvent::Speech);
        gate.process(frame(20), VadEvent::SpeechEnd);

        let segment = rx.try_recv().expect("segment should be emitted");
        assert!(segment.sample_count() > 0);
        // Emission atomically closed the listening window.
        assert!(!flag.is_listening());
    }

    #[tokio::test]
    async fn test_segment_discarded_while_not_listening() {
        let (mut gate, flag, mut rx) = gate_with_channel(false);

        gate.process(frame(0), VadEvent::SpeechStart);
        gate.process(frame(10), VadEvent::SpeechEnd);

        assert!(rx.try_recv().is_err());
        assert!(!flag.is_listening());
    }

    #[tokio::test]
    async fn test_empty_end_of_speech_is_noop() {
        let flag = ListeningFlag::new();
        flag.set(true);
        let (tx, mut rx) = mpsc::channel(1);
        let mut gate = VoiceActivityGate::new(0, flag.clone(), tx);

        // No buffered frames at all: pre-roll of zero and the
        // end-of-speech frame is the only content.
        gate.buffer.clear();
        gate.finalize();

        assert!(rx.try_recv().is_err());
        // The no-op must not consume the listening turn.
        assert!(flag.is_listening());
    }

    #[tokio::test]
    async fn test_only_one_segment_in_flight() {
        let (mut gate, flag, mut rx) = gate_with_channel(true);

        gate.process(frame(0), VadEvent::SpeechStart);
        gate.process(frame(10), VadEvent::SpeechEnd);

        // Second segment finalized before the first was consumed: the
        // listening flag is already taken, so it is discarded.
        gate.process(frame(20), VadEvent::SpeechStart);
        gate.process(frame(30), VadEvent::SpeechEnd);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert!(!flag.is_listening());
    }

    #[test]
    fn test_try_take_is_single_shot() {
        let flag = ListeningFlag::new();
        flag.set(true);
        assert!(flag.try_take());
        assert!(!flag.try_take());
    }
}
