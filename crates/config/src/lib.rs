//! Configuration for the outbound call agent
//!
//! Settings are layered: defaults, then an optional TOML file, then
//! `CALL_AGENT_*` environment overrides. The loaded value is immutable
//! and passed explicitly into the controller's constructor; core logic
//! never reads configuration from globals.

mod settings;

pub use settings::{
    AudioConfig, DialogConfig, KeywordConfig, LlmConfig, MessageConfig, Settings, SttConfig,
    TelephonyConfig, TtsConfig,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
