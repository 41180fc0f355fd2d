//! Caller intent classification result

use serde::{Deserialize, Serialize};

/// The outcome of classifying one utterance
///
/// Produced by the classifier and consumed exactly once by the dialog
/// controller to select the next transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Callee expressed interest
    Interested,
    /// Callee declined
    NotInterested,
    /// Could not determine intent
    Unclear,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interested => "interested",
            Self::NotInterested => "not_interested",
            Self::Unclear => "unclear",
        }
    }

    /// Terminal intents end the call regardless of the retry counter
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Interested | Self::NotInterested)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_intents() {
        assert!(Intent::Interested.is_terminal());
        assert!(Intent::NotInterested.is_terminal());
        assert!(!Intent::Unclear.is_terminal());
    }
}
