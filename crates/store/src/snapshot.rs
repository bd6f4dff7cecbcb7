//! Combined export/import document.
//!
//! Export produces a single versioned document embedding all three
//! aggregates verbatim; import parses and checks the whole document before
//! any in-memory state is replaced, so a malformed payload can never leave
//! the store half-imported.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use profile::{Pairing, PairingCode, UserProfile};

use crate::error::StoreError;

/// Version tag written into every export. Imports reject anything else.
pub const EXPORT_VERSION: &str = "1.0";

/// Full-store snapshot: a version tag, the export timestamp, and the three
/// aggregates keyed by their natural ids. The derived user→pairings index
/// is intentionally absent — it is rebuilt from `pairings` on import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub users: HashMap<String, UserProfile>,
    pub codes: HashMap<String, PairingCode>,
    pub pairings: HashMap<String, Pairing>,
}

impl ExportDocument {
    /// Parse a document from JSON text. Unknown enum values or malformed
    /// timestamps anywhere in the payload fail the whole parse.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let doc: ExportDocument = serde_json::from_str(json)?;
        doc.check_version()?;
        Ok(doc)
    }

    /// Serialize for transport or archival.
    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject documents written by an incompatible exporter.
    pub fn check_version(&self) -> Result<(), StoreError> {
        if self.version != EXPORT_VERSION {
            return Err(StoreError::UnsupportedSnapshotVersion(self.version.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_foreign_versions() {
        let doc = ExportDocument {
            version: "2.7".into(),
            exported_at: Utc::now(),
            users: HashMap::new(),
            codes: HashMap::new(),
            pairings: HashMap::new(),
        };
        let json = doc.to_json_pretty().unwrap();
        assert!(matches!(
            ExportDocument::from_json(&json),
            Err(StoreError::UnsupportedSnapshotVersion(v)) if v == "2.7"
        ));
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(ExportDocument::from_json("{not json").is_err());
        // Structurally valid JSON with a bad enum value inside.
        let bad = format!(
            r#"{{"version":"{EXPORT_VERSION}","exported_at":"2026-01-01T00:00:00Z",
                "users":{{}},"codes":{{}},
                "pairings":{{"p1":{{"pairing_id":"p1","user1_id":"a","user2_id":"b",
                "created_at":"2026-01-01T00:00:00Z","status":"frozen",
                "compatibility_score":0.1,"shared_interests":[],
                "last_interaction":"2026-01-01T00:00:00Z","metadata":{{}}}}}}}}"#
        );
        assert!(matches!(
            ExportDocument::from_json(&bad),
            Err(StoreError::Serialization(_))
        ));
    }
}
