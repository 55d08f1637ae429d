//! Query normalization and lookup heuristics.
//!
//! Normalization defines query equality for the whole engine: cache keys,
//! redundant-call suppression, and remote result reconciliation all compare
//! normalized forms, never raw input.

/// Minimum normalized length before a query may trigger a remote search.
pub const MIN_QUERY_LEN: usize = 3;

/// Queries longer than this that also contain a space are treated as
/// natural-language needs rather than catalog name lookups.
const NATURAL_LANGUAGE_MIN_LEN: usize = 10;

/// A query in canonical form: trimmed and lowercased.
///
/// Two queries are equal iff their normalized forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the query is long enough to be sent to the remote service.
    pub fn meets_min_len(&self) -> bool {
        self.0.chars().count() >= MIN_QUERY_LEN
    }

    /// True when the query reads like a natural-language need ("funding for
    /// rural broadband") rather than a catalog name prefix. The orchestrator
    /// issues a remote call for these even when local matches exist.
    pub fn looks_like_natural_language(&self) -> bool {
        self.0.contains(' ') && self.0.chars().count() > NATURAL_LANGUAGE_MIN_LEN
    }

    /// True when `self` is the result of backspacing within `previous`: a
    /// strict prefix, shorter than the previously committed query.
    pub fn is_prefix_shrink_of(&self, previous: &NormalizedQuery) -> bool {
        self.0.len() < previous.0.len() && previous.0.starts_with(&self.0)
    }
}

impl std::fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Match key for a grant name: trimmed, trailing `/` stripped, lowercased.
/// Remote results map onto catalog records through this key.
pub fn match_key(name: &str) -> String {
    name.trim().trim_end_matches('/').trim().to_lowercase()
}
