//! Transcription adapter
//!
//! Converts a finalized speech segment into text via an external
//! Whisper-compatible HTTP service. This boundary never raises: any
//! transport error, non-success response, or timeout yields an empty
//! transcript, which is itself the failure signal the controller
//! consumes (treated as inaudible audio, not as an unclear reply).

use async_trait::async_trait;
use serde::Deserialize;

use crate::{wav, PipelineError};
use call_agent_config::SttConfig;
use call_agent_core::{SpeechSegment, Utterance};

/// Speech-to-text adapter trait
///
/// Takes ownership of the segment; after transcription the audio is
/// discarded.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, segment: SpeechSegment) -> Utterance;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// HTTP transcription adapter for `/audio/transcriptions` endpoints
pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpTranscriber {
    pub fn new(config: &SttConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Stt(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/audio/transcriptions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    async fn request(&self, segment: &SpeechSegment) -> Result<String, PipelineError> {
        let wav_bytes = wav::encode_segment(segment)?;

        let part = reqwest::multipart::Part::bytes(wav_bytes)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| PipelineError::Stt(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::Stt(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Stt(format!(
                "transcription service returned {}",
                response.status()
            )));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Stt(e.to_string()))?;

        Ok(body.text.to_lowercase())
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, segment: SpeechSegment) -> Utterance {
        let started_at_ms = segment.started_at_ms;
        let ended_at_ms = segment.ended_at_ms;

        match self.request(&segment).await {
            Ok(text) => {
                tracing::info!(%text, duration_ms = segment.duration_ms(), "Transcribed segment");
                Utterance::new(text, started_at_ms, ended_at_ms)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transcription failed, treating as silence");
                Utterance::new("", started_at_ms, ended_at_ms)
            }
        }
    }
}
