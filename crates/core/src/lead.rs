//! Lead records
//!
//! A lead is a callee who expressed interest, captured for follow-up.
//! Records are append-only: written once per interested outcome and
//! never mutated or deleted by this system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome status stored with a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Interested,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interested => "interested",
        }
    }
}

/// One appended lead row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub phone_number: String,
    pub status: LeadStatus,
    pub recorded_at: DateTime<Utc>,
}

impl LeadRecord {
    pub fn new(phone_number: impl Into<String>, status: LeadStatus) -> Self {
        Self {
            phone_number: phone_number.into(),
            status,
            recorded_at: Utc::now(),
        }
    }

    /// Date column, `YYYY-MM-DD`
    pub fn date(&self) -> String {
        self.recorded_at.format("%Y-%m-%d").to_string()
    }

    /// Time column, `HH:MM:SS`
    pub fn time(&self) -> String {
        self.recorded_at.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_columns() {
        let lead = LeadRecord::new("+15550100", LeadStatus::Interested);
        assert_eq!(lead.phone_number, "+15550100");
        assert_eq!(lead.status.as_str(), "interested");
        assert_eq!(lead.date().len(), 10);
        assert_eq!(lead.time().len(), 8);
    }
}
