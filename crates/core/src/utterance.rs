//! Transcribed utterance

/// The text result of transcribing one speech segment
///
/// Paired with the originating segment's timing. Consumed once by the
/// intent classifier, then discarded.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Lowercased transcript text; empty when transcription failed
    pub text: String,
    /// Start of the originating segment, milliseconds since call start
    pub started_at_ms: u64,
    /// End of the originating segment
    pub ended_at_ms: u64,
}

impl Utterance {
    pub fn new(text: impl Into<String>, started_at_ms: u64, ended_at_ms: u64) -> Self {
        Self {
            text: text.into(),
            started_at_ms,
            ended_at_ms,
        }
    }

    /// An empty transcript is the transcription failure signal
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Number of non-whitespace characters in the transcript
    pub fn len_chars(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}
