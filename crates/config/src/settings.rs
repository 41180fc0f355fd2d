//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Spoken messages and the LLM system prompt
    #[serde(default)]
    pub messages: MessageConfig,

    /// Keyword sets for the deterministic classifier tier
    #[serde(default)]
    pub keywords: KeywordConfig,

    /// Speech-to-text service
    #[serde(default)]
    pub stt: SttConfig,

    /// Text-to-speech service
    #[serde(default)]
    pub tts: TtsConfig,

    /// LLM classification fallback
    #[serde(default)]
    pub llm: LlmConfig,

    /// Telephony / SIP trunk settings
    #[serde(default)]
    pub telephony: TelephonyConfig,

    /// Inbound audio settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Dialog controller tuning
    #[serde(default)]
    pub dialog: DialogConfig,
}

impl Settings {
    /// Load settings from an optional file plus environment overrides
    ///
    /// Environment variables use the `CALL_AGENT_` prefix with `__` as
    /// the section separator, e.g. `CALL_AGENT_DIALOG__MAX_ATTEMPTS=3`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("CALL_AGENT").separator("__"))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dialog.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dialog.max_attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.audio.sample_rate_hz == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audio.sample_rate_hz".to_string(),
                message: "must be non-zero".to_string(),
            });
        }

        if self.keywords.positive.is_empty() || self.keywords.negative.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "keywords".to_string(),
                message: "positive and negative keyword sets must be non-empty".to_string(),
            });
        }

        if self.llm.temperature != 0.0 {
            tracing::warn!(
                temperature = self.llm.temperature,
                "Non-zero LLM temperature makes classification non-deterministic"
            );
        }

        Ok(())
    }
}

/// Spoken messages and prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    /// System instruction for the LLM classification fallback
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Greeting spoken after the call is answered
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Greeting for dispatches without a phone number
    #[serde(default = "default_fallback_greeting")]
    pub fallback_greeting: String,

    /// Closing message for an interested callee
    #[serde(default = "default_interested")]
    pub interested: String,

    /// Closing message for a not-interested callee
    #[serde(default = "default_not_interested")]
    pub not_interested: String,

    /// Clarification prompt after an unclear reply
    #[serde(default = "default_clarification")]
    pub clarification: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            greeting: default_greeting(),
            fallback_greeting: default_fallback_greeting(),
            interested: default_interested(),
            not_interested: default_not_interested(),
            clarification: default_clarification(),
        }
    }
}

fn default_system_prompt() -> String {
    "You are classifying the spoken reply of a callee on an outbound sales call. \
     Classify their intent as one of:\n\
     - \"interested\" - if they say Yes, Sure, Okay, Tell me more, or show any interest\n\
     - \"not_interested\" - if they say No, Not interested, Busy, Don't call, Bye, or decline\n\
     - \"unclear\" - if you cannot determine their intent\n\
     Respond with ONLY one of these three words: interested, not_interested, unclear. \
     Do not add any explanation or extra text."
        .to_string()
}

fn default_greeting() -> String {
    "Hello, I am calling from Kickr Technology. We provide IT services including \
     web development, mobile apps, and AI solutions. Are you interested in learning more?"
        .to_string()
}

fn default_fallback_greeting() -> String {
    "Hello! I am the Kickr Technology assistant. How can I help you today?".to_string()
}

fn default_interested() -> String {
    "That's wonderful! Our team will reach out to you shortly with more details. \
     Thank you and have a great day!"
        .to_string()
}

fn default_not_interested() -> String {
    "No problem at all. Thank you for your time. Have a great day!".to_string()
}

fn default_clarification() -> String {
    "I'm sorry, could you please say Yes or No?".to_string()
}

/// Keyword sets for the deterministic classifier tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Interested markers
    #[serde(default = "default_positive_keywords")]
    pub positive: Vec<String>,

    /// Not-interested markers, checked before the positive set
    #[serde(default = "default_negative_keywords")]
    pub negative: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            positive: default_positive_keywords(),
            negative: default_negative_keywords(),
        }
    }
}

fn default_positive_keywords() -> Vec<String> {
    ["yes", "yeah", "sure", "okay", "interested", "tell me more"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_negative_keywords() -> Vec<String> {
    ["not interested", "no", "nope", "bye", "busy", "don't call"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Speech-to-text service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// OpenAI-compatible base URL, e.g. `http://localhost:8000/v1`
    #[serde(default = "default_stt_url")]
    pub base_url: String,

    /// Model identifier sent with each request
    #[serde(default = "default_stt_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            base_url: default_stt_url(),
            model: default_stt_model(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_stt_url() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

/// Text-to-speech service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// OpenAI-compatible base URL, e.g. `http://localhost:8880/v1`
    #[serde(default = "default_tts_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_tts_model")]
    pub model: String,

    /// Voice name
    #[serde(default = "default_tts_voice")]
    pub voice: String,

    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tts_url(),
            model: default_tts_model(),
            voice: default_tts_voice(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_tts_url() -> String {
    "http://localhost:8880/v1".to_string()
}

fn default_tts_model() -> String {
    "kokoro".to_string()
}

fn default_tts_voice() -> String {
    "af_sarah".to_string()
}

/// LLM classification fallback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL, e.g. `http://localhost:11434/v1`
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    /// API key; local backends accept a dummy value
    #[serde(default = "default_llm_api_key")]
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature; 0 for deterministic classification
    #[serde(default)]
    pub temperature: f32,

    /// Output token cap; classification needs only a word
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            api_key: default_llm_api_key(),
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_llm_max_tokens(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_llm_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_llm_api_key() -> String {
    "dummy".to_string()
}

fn default_llm_model() -> String {
    "llama3.2:1b".to_string()
}

fn default_llm_max_tokens() -> u32 {
    8
}

/// Telephony settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelephonyConfig {
    /// SIP trunk identifier used to originate PSTN calls
    #[serde(default)]
    pub sip_trunk_id: String,

    /// Caller id presented to the callee
    #[serde(default)]
    pub outbound_number: String,
}

/// Inbound audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// PCM sample rate delivered by the telephony leg
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,

    /// Frames of pre-roll kept before a start-of-speech boundary,
    /// covering VAD detection latency
    #[serde(default = "default_pre_roll_frames")]
    pub pre_roll_frames: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate(),
            pre_roll_frames: default_pre_roll_frames(),
        }
    }
}

fn default_sample_rate() -> u32 {
    48_000
}

fn default_pre_roll_frames() -> usize {
    5
}

/// Dialog controller tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Maximum unclear classifications before the safe-default closing
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Transcripts shorter than this are treated as noise
    #[serde(default = "default_min_utterance_chars")]
    pub min_utterance_chars: usize,

    /// Pause after answer before the greeting, letting audio stabilize
    #[serde(default = "default_post_answer_delay_ms")]
    pub post_answer_delay_ms: u64,

    /// Grace delay after the closing message so trailing audio flushes
    #[serde(default = "default_hangup_grace_ms")]
    pub hangup_grace_ms: u64,

    /// Whole-call deadline; on expiry the call is hung up
    #[serde(default = "default_call_deadline_secs")]
    pub call_deadline_secs: u64,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_utterance_chars: default_min_utterance_chars(),
            post_answer_delay_ms: default_post_answer_delay_ms(),
            hangup_grace_ms: default_hangup_grace_ms(),
            call_deadline_secs: default_call_deadline_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_min_utterance_chars() -> usize {
    2
}

fn default_post_answer_delay_ms() -> u64 {
    500
}

fn default_hangup_grace_ms() -> u64 {
    500
}

fn default_call_deadline_secs() -> u64 {
    45
}

fn default_http_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.dialog.max_attempts, 3);
        assert_eq!(settings.audio.sample_rate_hz, 48_000);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut settings = Settings::default();
        settings.dialog.max_attempts = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let mut settings = Settings::default();
        settings.keywords.negative.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_negative_set_covers_contained_positive() {
        // "not interested" must be present so the negative tier wins
        // over the "interested" substring.
        let keywords = KeywordConfig::default();
        assert!(keywords.negative.iter().any(|k| k == "not interested"));
        assert!(keywords.positive.iter().any(|k| k == "interested"));
    }
}
