//! Normalized entity structs for the grant catalog and search results.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a grant notice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    Active,
    Archived,
}

/// A single funding notice (NOFO) as fetched from the external catalog.
///
/// The search core treats the catalog as read-only; records are mutated only
/// by the admin CRUD path, which is outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRecord {
    pub id: String,
    /// Unique, case-insensitive match key after trimming trailing `/`.
    pub name: String,
    pub status: GrantStatus,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub grant_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<chrono::NaiveDate>,
}

impl GrantRecord {
    /// Key used to reconcile this record against remote results.
    pub fn match_key(&self) -> String {
        crate::search::normalize::match_key(&self.name)
    }
}

/// Which internal backend strategy produced a remote result. Opaque to the
/// ranker; carried through for display and diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Hybrid,
    Category,
    Agency,
    Pinned,
    Local,
}

/// One scored result from the remote AI search service.
///
/// Validated and coerced at the client boundary; ranking logic only ever
/// sees this fixed shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    /// Higher is more relevant.
    pub score: f64,
    pub source: ResultSource,
    #[serde(default)]
    pub reason: String,
}

impl SearchResult {
    pub fn match_key(&self) -> String {
        crate::search::normalize::match_key(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_record_deserializes_with_defaults() {
        let rec: GrantRecord = serde_json::from_str(
            r#"{"id":"g-1","name":"Clean Water Fund","status":"active"}"#,
        )
        .unwrap();
        assert_eq!(rec.name, "Clean Water Fund");
        assert_eq!(rec.status, GrantStatus::Active);
        assert!(!rec.is_pinned);
        assert!(rec.agency.is_none());
    }

    #[test]
    fn match_key_ignores_case_and_trailing_slash() {
        let rec: GrantRecord = serde_json::from_str(
            r#"{"id":"g-2","name":" Clean Water Fund/ ","status":"archived","isPinned":true}"#,
        )
        .unwrap();
        assert_eq!(rec.match_key(), "clean water fund");
        assert!(rec.is_pinned);
    }

    #[test]
    fn result_source_round_trips_lowercase() {
        let r: SearchResult = serde_json::from_str(
            r#"{"name":"X","score":42.5,"source":"hybrid","reason":"semantic match"}"#,
        )
        .unwrap();
        assert_eq!(r.source, ResultSource::Hybrid);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"hybrid\""));
    }
}
