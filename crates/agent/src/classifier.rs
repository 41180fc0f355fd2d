//! Two-tier intent classification
//!
//! Tier one is deterministic keyword matching, checked first on every
//! utterance so the common yes/no replies never pay LLM latency or
//! cost. Tier two is an LLM chat-completion fallback consulted only
//! when the keyword tier is inconclusive. Any failure in the fallback
//! degrades to `Unclear`, never to a hard error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use call_agent_config::{KeywordConfig, LlmConfig};
use call_agent_core::Intent;

/// Deterministic keyword tier
///
/// Matching is case-insensitive and punctuation-stripped. The negative
/// set is checked before the positive set because phrases like
/// "not interested" textually contain "interested".
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl KeywordMatcher {
    pub fn new(config: &KeywordConfig) -> Self {
        Self {
            positive: config.positive.iter().map(|k| normalize(k)).collect(),
            negative: config.negative.iter().map(|k| normalize(k)).collect(),
        }
    }

    /// Classify by substring match, `None` when inconclusive
    pub fn classify(&self, text: &str) -> Option<Intent> {
        let text = normalize(text);

        if self.negative.iter().any(|k| text.contains(k.as_str())) {
            return Some(Intent::NotInterested);
        }
        if self.positive.iter().any(|k| text.contains(k.as_str())) {
            return Some(Intent::Interested);
        }
        None
    }
}

/// Lowercase and replace punctuation with spaces, collapsing runs
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() || c == '\'' {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// LLM fallback tier trait
///
/// Consulted only when keyword matching is inconclusive.
#[async_trait]
pub trait FallbackClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Intent;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

/// Chat-completion backed fallback classifier
pub struct HttpLlmClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpLlmClassifier {
    pub fn new(config: &LlmConfig, system_prompt: impl Into<String>) -> Result<Self, crate::AgentError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| crate::AgentError::Classifier(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            system_prompt: system_prompt.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    async fn request(&self, text: &str) -> Result<String, crate::AgentError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| crate::AgentError::Classifier(e.to_string()))?;

        if !response.status().is_success() {
            return Err(crate::AgentError::Classifier(format!(
                "chat service returned {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| crate::AgentError::Classifier(e.to_string()))?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Map a model reply onto an intent
///
/// Checked in the same negative-first order as the keyword tier: the
/// literal "not_interested"/"not interested" wins over "interested".
fn parse_reply(reply: &str) -> Intent {
    let reply = reply.to_lowercase();
    if reply.contains("not_interested") || reply.contains("not interested") {
        Intent::NotInterested
    } else if reply.contains("interested") {
        Intent::Interested
    } else {
        Intent::Unclear
    }
}

#[async_trait]
impl FallbackClassifier for HttpLlmClassifier {
    async fn classify(&self, text: &str) -> Intent {
        match self.request(text).await {
            Ok(reply) => {
                let intent = parse_reply(&reply);
                tracing::debug!(%reply, %intent, "LLM fallback classification");
                intent
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM fallback failed, returning unclear");
                Intent::Unclear
            }
        }
    }
}

/// The full two-tier classifier
pub struct IntentClassifier {
    keywords: KeywordMatcher,
    fallback: Arc<dyn FallbackClassifier>,
}

impl IntentClassifier {
    pub fn new(keywords: KeywordMatcher, fallback: Arc<dyn FallbackClassifier>) -> Self {
        Self { keywords, fallback }
    }

    /// Classify one utterance
    pub async fn classify(&self, text: &str) -> Intent {
        if let Some(intent) = self.keywords.classify(text) {
            tracing::debug!(%intent, "Keyword tier matched");
            return intent;
        }
        self.fallback.classify(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFallback {
        calls: AtomicUsize,
        intent: Intent,
    }

    #[async_trait]
    impl FallbackClassifier for CountingFallback {
        async fn classify(&self, _text: &str) -> Intent {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.intent
        }
    }

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(&KeywordConfig::default())
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("No, thanks!"), "no thanks");
        assert_eq!(normalize("  Don't   call."), "don't call");
    }

    #[test]
    fn test_negative_checked_before_positive() {
        // "not interested" contains "interested"; negative tier wins.
        assert_eq!(
            matcher().classify("I'm not interested"),
            Some(Intent::NotInterested)
        );
    }

    #[test]
    fn test_positive_match() {
        assert_eq!(matcher().classify("Yes, sure"), Some(Intent::Interested));
        assert_eq!(matcher().classify("Okay!"), Some(Intent::Interested));
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        assert_eq!(matcher().classify("SURE."), Some(Intent::Interested));
        assert_eq!(matcher().classify("Nope..."), Some(Intent::NotInterested));
    }

    #[test]
    fn test_inconclusive_text() {
        assert_eq!(matcher().classify("maybe later"), None);
    }

    #[test]
    fn test_parse_reply_priority() {
        assert_eq!(parse_reply("not_interested"), Intent::NotInterested);
        assert_eq!(parse_reply("Not interested."), Intent::NotInterested);
        assert_eq!(parse_reply("interested"), Intent::Interested);
        assert_eq!(parse_reply("I have no idea"), Intent::Unclear);
    }

    #[tokio::test]
    async fn test_keyword_tier_short_circuits_fallback() {
        let fallback = Arc::new(CountingFallback {
            calls: AtomicUsize::new(0),
            intent: Intent::Unclear,
        });
        let classifier = IntentClassifier::new(matcher(), fallback.clone());

        assert_eq!(classifier.classify("yes sure").await, Intent::Interested);
        assert_eq!(
            classifier.classify("no thanks").await,
            Intent::NotInterested
        );
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_consulted_when_inconclusive() {
        let fallback = Arc::new(CountingFallback {
            calls: AtomicUsize::new(0),
            intent: Intent::Interested,
        });
        let classifier = IntentClassifier::new(matcher(), fallback.clone());

        assert_eq!(
            classifier.classify("hmm let me think").await,
            Intent::Interested
        );
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_llm_degrades_to_unclear() {
        let config = LlmConfig {
            base_url: "http://192.0.2.1:1/v1".to_string(),
            timeout_secs: 1,
            ..LlmConfig::default()
        };
        let llm = HttpLlmClassifier::new(&config, "classify").unwrap();
        assert_eq!(llm.classify("anything").await, Intent::Unclear);
    }
}
