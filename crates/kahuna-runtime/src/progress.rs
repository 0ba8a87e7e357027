//! Map-level experiment progress.
//!
//! `GetExperimentStatus` breaks the envelope convention: its `Content`
//! is a JSON object rather than a string, so it gets its own decoder
//! instead of going through [`kahuna_protocol::StatusEnvelope`]. The
//! object carries the instrument's current action and a free-text
//! statement like `"Map 3 of 12: Dispense monomer"`.

use kahuna_protocol::ProtocolError;
use serde_json::Value;

/// Position within the experiment's map sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapProgress {
    /// 1-based index of the map in progress.
    pub map: u32,
    /// Total maps in the design.
    pub total_maps: u32,
    /// The vendor's description of the map.
    pub description: String,
}

impl MapProgress {
    /// Parses a `"Map N of M: description"` statement.
    ///
    /// Anything that does not match the shape yields `None`; progress
    /// statements are advisory and junk is never an error.
    #[must_use]
    pub fn parse(statement: &str) -> Option<Self> {
        let rest = statement.strip_prefix("Map ")?;
        let (map, rest) = rest.split_once(" of ")?;
        let (total, description) = rest.split_once(':')?;

        Some(Self {
            map: map.trim().parse().ok()?,
            total_maps: total.trim().parse().ok()?,
            description: description.trim().to_string(),
        })
    }
}

/// Decoded `GetExperimentStatus` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperimentProgress {
    /// The instrument's current action, when reported.
    pub current_action: Option<String>,
    /// The verbatim map statement, when reported.
    pub statement: Option<String>,
    /// The parsed map position, when the statement matched.
    pub progress: Option<MapProgress>,
}

impl ExperimentProgress {
    /// Decodes a raw `GetExperimentStatus` response.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedEnvelope`] for unparsable JSON
    /// and [`ProtocolError::VendorFailure`] for a negative status code.
    /// A well-formed response without progress fields decodes to the
    /// empty default.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let doc: Value = serde_json::from_str(raw)
            .map_err(|e| ProtocolError::malformed_envelope(e.to_string()))?;

        let status_code = doc.get("StatusCode").and_then(Value::as_i64).unwrap_or(0);
        if status_code < 0 {
            return Err(ProtocolError::VendorFailure {
                status_code,
                error: doc
                    .get("Error")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        let Some(content) = doc.get("Content").and_then(Value::as_object) else {
            return Ok(Self::default());
        };

        let current_action = content
            .get("CurrentAction")
            .and_then(Value::as_str)
            .map(str::to_string);
        let statement = content
            .get("CurrentMap")
            .and_then(Value::as_str)
            .map(str::to_string);
        let progress = statement.as_deref().and_then(MapProgress::parse);

        Ok(Self {
            current_action,
            statement,
            progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_map_statement() {
        let progress = MapProgress::parse("Map 3 of 12: Dispense syrup").unwrap();
        assert_eq!(progress.map, 3);
        assert_eq!(progress.total_maps, 12);
        assert_eq!(progress.description, "Dispense syrup");
    }

    #[test]
    fn junk_statements_yield_none() {
        for junk in [
            "",
            "Map of 12: no index",
            "Map three of 12: words",
            "Idle",
            "Map 3 of twelve missing colon",
        ] {
            assert_eq!(MapProgress::parse(junk), None, "{junk:?}");
        }
    }

    #[test]
    fn decodes_object_content() {
        let raw = r#"{
            "Status": "Success",
            "Content": {"CurrentAction": "Dispensing", "CurrentMap": "Map 2 of 4: Wash"},
            "Error": "",
            "StatusCode": 0
        }"#;
        let decoded = ExperimentProgress::decode(raw).unwrap();
        assert_eq!(decoded.current_action.as_deref(), Some("Dispensing"));
        let progress = decoded.progress.unwrap();
        assert_eq!((progress.map, progress.total_maps), (2, 4));
    }

    #[test]
    fn string_content_decodes_to_empty() {
        let raw = r#"{"Status":"Success","Content":"","Error":"","StatusCode":0}"#;
        assert_eq!(
            ExperimentProgress::decode(raw).unwrap(),
            ExperimentProgress::default()
        );
    }

    #[test]
    fn negative_code_is_vendor_failure() {
        let raw = r#"{"Status":"Failure","Content":{},"Error":"not running","StatusCode":-3}"#;
        let err = ExperimentProgress::decode(raw).unwrap_err();
        assert!(matches!(err, ProtocolError::VendorFailure { .. }));
    }
}
