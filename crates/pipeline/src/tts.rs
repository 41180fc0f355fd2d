//! Text-to-speech adapter
//!
//! Synthesizes agent speech through an external OpenAI-compatible
//! `/audio/speech` endpoint and exposes the result as a stream of PCM
//! frames the controller plays into the call.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::{wav, PipelineError};
use call_agent_config::TtsConfig;
use call_agent_core::{AudioFrame, Channels, SampleRate};

/// Frame size used when slicing synthesized audio, in milliseconds
const TTS_FRAME_MS: u32 = 20;

/// Text-to-speech engine trait
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Synthesize text into a stream of audio frames
    ///
    /// The returned channel closes once the final frame is delivered;
    /// draining it to completion is how callers wait for synthesis to
    /// finish.
    async fn synthesize(&self, text: &str) -> Result<mpsc::Receiver<AudioFrame>, PipelineError>;
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
}

/// HTTP text-to-speech engine
pub struct HttpTtsEngine {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    voice: String,
}

impl HttpTtsEngine {
    pub fn new(config: &TtsConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Tts(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/audio/speech", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            voice: config.voice.clone(),
        })
    }

    async fn fetch_audio(&self, text: &str) -> Result<(Vec<i16>, u32), PipelineError> {
        let request = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            response_format: "wav",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Tts(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Tts(format!(
                "speech service returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Tts(e.to_string()))?;

        wav::decode(&bytes)
    }
}

#[async_trait]
impl TtsEngine for HttpTtsEngine {
    async fn synthesize(&self, text: &str) -> Result<mpsc::Receiver<AudioFrame>, PipelineError> {
        let (samples, sample_rate_hz) = self.fetch_audio(text).await?;

        let sample_rate = SampleRate::from_hz(sample_rate_hz).ok_or_else(|| {
            PipelineError::Tts(format!("unsupported sample rate {sample_rate_hz}"))
        })?;

        let samples_per_frame = (sample_rate_hz * TTS_FRAME_MS / 1_000) as usize;
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut timestamp_ms = 0u64;
            for chunk in samples.chunks(samples_per_frame.max(1)) {
                let frame = AudioFrame::new(
                    chunk.to_vec(),
                    sample_rate,
                    Channels::Mono,
                    timestamp_ms,
                );
                timestamp_ms += u64::from(TTS_FRAME_MS);
                if tx.send(frame).await.is_err() {
                    // Receiver dropped: the call ended mid-utterance.
                    break;
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let config = TtsConfig {
            base_url: "http://192.0.2.1:1/v1".to_string(),
            timeout_secs: 1,
            ..TtsConfig::default()
        };
        let engine = HttpTtsEngine::new(&config).unwrap();
        assert!(engine.synthesize("hello").await.is_err());
    }

    #[test]
    fn test_endpoint_construction() {
        let engine = HttpTtsEngine::new(&TtsConfig::default()).unwrap();
        assert_eq!(engine.endpoint, "http://localhost:8880/v1/audio/speech");
    }
}
