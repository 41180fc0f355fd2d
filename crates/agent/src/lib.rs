//! Call agent
//!
//! Two-tier intent classification and the dialog controller that
//! drives an outbound call from dial-out to hangup.

pub mod classifier;
pub mod controller;
pub mod dispatch;

pub use classifier::{FallbackClassifier, HttpLlmClassifier, IntentClassifier, KeywordMatcher};
pub use controller::{
    CallOutcome, CallPhase, CallSession, ControllerDeps, ControllerEvent, DialogController,
};
pub use dispatch::CallDispatch;

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Segment channel closed before the call ended")]
    ChannelClosed,

    #[error("Classifier error: {0}")]
    Classifier(String),
}

impl From<AgentError> for call_agent_core::Error {
    fn from(err: AgentError) -> Self {
        call_agent_core::Error::Classifier(err.to_string())
    }
}
