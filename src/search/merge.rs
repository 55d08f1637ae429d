//! Reconciles pinned, local, and remote results into one ordered list.
//!
//! Two regimes:
//! - No remote ranking: pinned-first, each group alphabetical. Pinned records
//!   are deduplicated by match key against the local matches.
//! - Remote ranking active: the remote result set defines the candidate set,
//!   not just the order. Descending score, ties alphabetical; pinned status
//!   is carried on the record but does not affect ordering.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{GrantRecord, SearchResult};
use crate::search::local;

/// Merge a local candidate list with optional remote results. Without
/// remote results `locals` is the substring-filtered list (pinned subset
/// included); with them it is the whole catalog, since remote relevance may
/// surface records the substring filter would not.
pub fn merge(locals: &[GrantRecord], remote: Option<&[SearchResult]>) -> Vec<GrantRecord> {
    match remote {
        Some(results) if !results.is_empty() => rank_by_remote(locals, results),
        _ => default_order(locals),
    }
}

fn default_order(locals: &[GrantRecord]) -> Vec<GrantRecord> {
    let mut seen: HashMap<String, ()> = HashMap::new();
    let mut out: Vec<GrantRecord> = Vec::with_capacity(locals.len());
    // Pinned pass first so duplicates resolve in favor of the pinned copy.
    for rec in locals.iter().filter(|r| r.is_pinned) {
        if seen.insert(rec.match_key(), ()).is_none() {
            out.push(rec.clone());
        }
    }
    for rec in locals.iter().filter(|r| !r.is_pinned) {
        if seen.insert(rec.match_key(), ()).is_none() {
            out.push(rec.clone());
        }
    }
    local::sort_default(&mut out);
    out
}

fn rank_by_remote(locals: &[GrantRecord], results: &[SearchResult]) -> Vec<GrantRecord> {
    let mut scores: HashMap<String, f64> = HashMap::with_capacity(results.len());
    for res in results {
        // Keep the best score if the service returned the same name twice.
        let slot = scores.entry(res.match_key()).or_insert(f64::NEG_INFINITY);
        if res.score > *slot {
            *slot = res.score;
        }
    }

    let mut seen: HashMap<String, ()> = HashMap::new();
    let mut ranked: Vec<(f64, GrantRecord)> = Vec::new();
    for rec in locals {
        let key = rec.match_key();
        if let Some(&score) = scores.get(&key)
            && seen.insert(key, ()).is_none()
        {
            ranked.push((score, rec.clone()));
        }
    }

    ranked.sort_by(|(sa, ra), (sb, rb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| ra.name.to_lowercase().cmp(&rb.name.to_lowercase()))
    });
    ranked.into_iter().map(|(_, rec)| rec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GrantStatus, ResultSource};

    fn record(name: &str, pinned: bool) -> GrantRecord {
        GrantRecord {
            id: name.to_lowercase(),
            name: name.to_string(),
            status: GrantStatus::Active,
            is_pinned: pinned,
            grant_type: None,
            category: None,
            agency: None,
            expiration_date: None,
        }
    }

    fn result(name: &str, score: f64) -> SearchResult {
        SearchResult {
            name: name.to_string(),
            score,
            source: ResultSource::Hybrid,
            reason: String::new(),
        }
    }

    #[test]
    fn remote_results_define_candidates_and_order() {
        let locals = vec![record("A", false), record("B", false), record("C", false)];
        let remote = vec![result("A", 10.0), result("C", 50.0)];
        let merged = merge(&locals, Some(&remote));
        let names: Vec<_> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A"]);
    }

    #[test]
    fn pinned_does_not_outrank_remote_score() {
        let locals = vec![record("Pinned Low", true), record("Unpinned High", false)];
        let remote = vec![result("Pinned Low", 1.0), result("Unpinned High", 9.0)];
        let merged = merge(&locals, Some(&remote));
        assert_eq!(merged[0].name, "Unpinned High");
        assert!(merged[1].is_pinned);
    }

    #[test]
    fn score_ties_break_alphabetically() {
        let locals = vec![record("Beta", false), record("Alpha", false)];
        let remote = vec![result("Beta", 5.0), result("Alpha", 5.0)];
        let merged = merge(&locals, Some(&remote));
        let names: Vec<_> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn remote_name_matching_tolerates_case_and_slash() {
        let locals = vec![record("Clean Water Fund", false)];
        let remote = vec![result("clean water fund/", 3.0)];
        assert_eq!(merge(&locals, Some(&remote)).len(), 1);
    }

    #[test]
    fn empty_remote_falls_back_to_default_order() {
        let locals = vec![record("Y", false), record("X", false), record("Z", true)];
        let merged = merge(&locals, Some(&[]));
        let names: Vec<_> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "X", "Y"]);
    }

    #[test]
    fn no_remote_deduplicates_pinned_by_match_key() {
        let locals = vec![
            record("Shared Name", true),
            record("Shared Name/", false),
            record("Other", false),
        ];
        let merged = merge(&locals, None);
        assert_eq!(merged.len(), 2);
        // The pinned copy wins the dedupe and pinned-first keeps it in front.
        let names: Vec<_> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Shared Name", "Other"]);
        assert!(merged[0].is_pinned);
    }
}
