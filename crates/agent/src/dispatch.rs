//! Per-call dispatch payload

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DispatchMetadata {
    phone_number: Option<String>,
}

/// Metadata delivered when a call job is dispatched to the agent
///
/// The payload is a JSON object carrying the target phone number.
/// Missing or malformed metadata is tolerated: the controller then
/// skips dialing and runs the fallback conversational flow.
#[derive(Debug, Clone)]
pub struct CallDispatch {
    /// Room / call identifier
    pub call_id: String,
    /// Target number, opaque E.164-ish string
    pub phone_number: Option<String>,
}

impl CallDispatch {
    pub fn new(call_id: impl Into<String>, phone_number: Option<String>) -> Self {
        Self {
            call_id: call_id.into(),
            phone_number,
        }
    }

    /// Parse dispatch metadata
    pub fn from_metadata(call_id: impl Into<String>, metadata: Option<&str>) -> Self {
        let phone_number = metadata.and_then(|raw| {
            match serde_json::from_str::<DispatchMetadata>(raw) {
                Ok(parsed) => parsed.phone_number,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse dispatch metadata");
                    None
                }
            }
        });

        let dispatch = Self::new(call_id, phone_number);
        tracing::info!(
            call_id = %dispatch.call_id,
            phone = dispatch.phone_number.as_deref().unwrap_or("N/A"),
            "Call dispatched"
        );
        dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_metadata() {
        let dispatch =
            CallDispatch::from_metadata("call-1", Some(r#"{"phone_number": "+15550100"}"#));
        assert_eq!(dispatch.phone_number.as_deref(), Some("+15550100"));
    }

    #[test]
    fn test_missing_metadata() {
        let dispatch = CallDispatch::from_metadata("call-1", None);
        assert!(dispatch.phone_number.is_none());
    }

    #[test]
    fn test_malformed_metadata_is_tolerated() {
        let dispatch = CallDispatch::from_metadata("call-1", Some("not json"));
        assert!(dispatch.phone_number.is_none());
    }

    #[test]
    fn test_metadata_without_phone_field() {
        let dispatch = CallDispatch::from_metadata("call-1", Some(r#"{"campaign": "q3"}"#));
        assert!(dispatch.phone_number.is_none());
    }
}
