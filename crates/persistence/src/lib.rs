//! Lead persistence
//!
//! Leads are appended to a durable, append-only store. Rows are never
//! mutated or deleted by this system. Writes happen off the
//! latency-critical audio path and failures never abort call
//! termination.

mod leads;

pub use leads::{CsvLeadStore, LeadStore};

use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Write task failed: {0}")]
    TaskJoin(String),
}

impl From<PersistenceError> for call_agent_core::Error {
    fn from(err: PersistenceError) -> Self {
        call_agent_core::Error::Persistence(err.to_string())
    }
}
