//! Call Lifecycle Gateway
//!
//! Contracts for the telephony layer that owns the media session:
//! dialing out over a SIP trunk, removing the remote participant, and
//! tearing the session down. The signaling implementation lives
//! outside this workspace; the dialog controller only consumes these
//! traits.

pub mod traits;

pub use traits::{AudioSink, DialOutcome, LifecycleGateway};

use thiserror::Error;

/// Telephony errors
#[derive(Error, Debug)]
pub enum TelephonyError {
    #[error("Dial failed: {0}")]
    DialFailed(String),

    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    #[error("Session teardown failed: {0}")]
    TeardownFailed(String),

    #[error("Audio publish failed: {0}")]
    AudioPublish(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TelephonyError> for call_agent_core::Error {
    fn from(err: TelephonyError) -> Self {
        call_agent_core::Error::Telephony(err.to_string())
    }
}

/// Generate a room/call identifier for a new outbound call
pub fn new_call_id() -> String {
    format!("call-{}", uuid::Uuid::new_v4())
}
