//! Gateway traits
//!
//! Abstract interfaces over the external telephony layer.

use async_trait::async_trait;

use crate::TelephonyError;
use call_agent_core::AudioFrame;

/// Result of an outbound dial attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialOutcome {
    /// Callee answered; the media leg is live
    Answered {
        /// Participant identity of the SIP leg, used for hangup
        participant_identity: String,
    },
    /// Carrier rejected, busy, or no answer
    Failed {
        reason: String,
    },
}

/// Call lifecycle gateway
///
/// `dial` blocks until the callee answers or the attempt fails.
/// Hangup is two-stage: `remove_participant` first, falling back to
/// `teardown_session` when removal fails.
#[async_trait]
pub trait LifecycleGateway: Send + Sync {
    /// Place an outbound call into the given room
    async fn dial(&self, call_id: &str, number: &str) -> Result<DialOutcome, TelephonyError>;

    /// Remove the remote participant, ending their leg of the call
    async fn remove_participant(
        &self,
        call_id: &str,
        participant_identity: &str,
    ) -> Result<(), TelephonyError>;

    /// Tear down the entire media session
    async fn teardown_session(&self, call_id: &str) -> Result<(), TelephonyError>;
}

/// Outbound audio sink
///
/// Synthesized speech frames are played into the call through this
/// sink. Implementations publish to the live media session.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play one frame into the call
    async fn send_frame(&self, frame: AudioFrame) -> Result<(), TelephonyError>;

    /// Flush any buffered audio
    async fn flush(&self) -> Result<(), TelephonyError>;
}
