//! Audio pipeline for the outbound call agent
//!
//! This crate provides the inbound audio path and the speech service
//! adapters:
//! - Speech segment buffering between VAD boundaries
//! - The voice activity gate that turns VAD events into finalized
//!   segments, suppressing audio captured while the agent speaks
//! - Transcription over a Whisper-compatible HTTP service
//! - Text-to-speech over an OpenAI-compatible HTTP service

pub mod gate;
pub mod segment_buffer;
pub mod stt;
pub mod tts;
mod wav;

pub use gate::{ListeningFlag, VadEvent, VoiceActivityGate};
pub use segment_buffer::SegmentBuffer;
pub use stt::{HttpTranscriber, Transcriber};
pub use tts::{HttpTtsEngine, TtsEngine};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Audio encoding error: {0}")]
    Audio(String),
}

impl From<PipelineError> for call_agent_core::Error {
    fn from(err: PipelineError) -> Self {
        call_agent_core::Error::Pipeline(err.to_string())
    }
}
