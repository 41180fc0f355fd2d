//! Core types for the outbound call agent
//!
//! This crate provides foundational types used across all other crates:
//! - Audio frame and speech segment types
//! - Transcription and intent types
//! - Lead records
//! - Error types

pub mod audio;
pub mod error;
pub mod intent;
pub mod lead;
pub mod utterance;

pub use audio::{AudioFrame, Channels, SampleRate, SpeechSegment};
pub use error::{Error, Result};
pub use intent::Intent;
pub use lead::{LeadRecord, LeadStatus};
pub use utterance::Utterance;
