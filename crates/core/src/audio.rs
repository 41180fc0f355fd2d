//! Audio frame and speech segment types
//!
//! The telephony leg delivers raw mono 16-bit PCM at a fixed sample
//! rate. Frames are small (typically 10-20ms); a [`SpeechSegment`] is
//! the run of frames between a start-of-speech and end-of-speech
//! boundary.

use serde::{Deserialize, Serialize};

/// Supported sample rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleRate {
    Hz8000,
    Hz16000,
    Hz24000,
    Hz48000,
}

impl SampleRate {
    /// Sample rate in Hz
    pub fn as_hz(&self) -> u32 {
        match self {
            Self::Hz8000 => 8_000,
            Self::Hz16000 => 16_000,
            Self::Hz24000 => 24_000,
            Self::Hz48000 => 48_000,
        }
    }

    /// Nearest supported rate for a raw Hz value
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            8_000 => Some(Self::Hz8000),
            16_000 => Some(Self::Hz16000),
            24_000 => Some(Self::Hz24000),
            48_000 => Some(Self::Hz48000),
            _ => None,
        }
    }
}

/// Channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    pub fn count(&self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// A single frame of PCM audio
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Signed 16-bit PCM samples
    pub samples: Vec<i16>,
    /// Sample rate
    pub sample_rate: SampleRate,
    /// Channel layout
    pub channels: Channels,
    /// Capture timestamp in milliseconds since call start
    pub timestamp_ms: u64,
}

impl AudioFrame {
    pub fn new(
        samples: Vec<i16>,
        sample_rate: SampleRate,
        channels: Channels,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
            timestamp_ms,
        }
    }

    /// Frame duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        let per_channel = self.samples.len() as u64 / self.channels.count() as u64;
        per_channel * 1_000 / self.sample_rate.as_hz() as u64
    }
}

/// An ordered run of frames bounded by VAD start/end events
///
/// A segment has exactly one owner at any time: the segment buffer
/// until finalized, then the transcription adapter. It is never
/// persisted.
#[derive(Debug)]
pub struct SpeechSegment {
    frames: Vec<AudioFrame>,
    /// Timestamp of the first frame, milliseconds since call start
    pub started_at_ms: u64,
    /// Timestamp of the last frame
    pub ended_at_ms: u64,
}

impl SpeechSegment {
    /// Build a segment from finalized frames
    ///
    /// Returns `None` for an empty frame run; end-of-speech with no
    /// buffered audio is a no-op upstream.
    pub fn from_frames(frames: Vec<AudioFrame>) -> Option<Self> {
        let first = frames.first()?.timestamp_ms;
        let last = frames.last()?;
        let ended_at_ms = last.timestamp_ms + last.duration_ms();
        Some(Self {
            frames,
            started_at_ms: first,
            ended_at_ms,
        })
    }

    /// Sample rate of the segment (taken from the first frame)
    pub fn sample_rate(&self) -> SampleRate {
        self.frames[0].sample_rate
    }

    /// Total number of samples across all frames
    pub fn sample_count(&self) -> usize {
        self.frames.iter().map(|f| f.samples.len()).sum()
    }

    /// Segment duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.ended_at_ms.saturating_sub(self.started_at_ms)
    }

    /// Concatenated little-endian PCM bytes of every frame
    pub fn to_pcm_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.sample_count() * 2);
        for frame in &self.frames {
            for sample in &frame.samples {
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }
        out
    }

    /// Iterate over the raw samples
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.frames.iter().flat_map(|f| f.samples.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: usize, ts: u64) -> AudioFrame {
        AudioFrame::new(vec![0i16; n], SampleRate::Hz16000, Channels::Mono, ts)
    }

    #[test]
    fn test_frame_duration() {
        // 320 samples at 16kHz mono = 20ms
        assert_eq!(frame(320, 0).duration_ms(), 20);
    }

    #[test]
    fn test_segment_from_empty_frames() {
        assert!(SpeechSegment::from_frames(Vec::new()).is_none());
    }

    #[test]
    fn test_segment_timing_and_bytes() {
        let segment = SpeechSegment::from_frames(vec![frame(320, 100), frame(320, 120)]).unwrap();
        assert_eq!(segment.started_at_ms, 100);
        assert_eq!(segment.ended_at_ms, 140);
        assert_eq!(segment.duration_ms(), 40);
        assert_eq!(segment.sample_count(), 640);
        assert_eq!(segment.to_pcm_bytes().len(), 1280);
    }
}
