//! Synchronous substring filtering over the in-memory catalog.

use crate::model::GrantRecord;
use crate::search::normalize::NormalizedQuery;

/// Filter the catalog to records whose name, agency, or category contains the
/// query substring, case-insensitively. An empty query matches everything.
pub fn filter(catalog: &[GrantRecord], query: &NormalizedQuery) -> Vec<GrantRecord> {
    let needle = query.as_str();
    catalog
        .iter()
        .filter(|rec| {
            needle.is_empty()
                || contains_ci(&rec.name, needle)
                || rec.agency.as_deref().is_some_and(|a| contains_ci(a, needle))
                || rec
                    .category
                    .as_deref()
                    .is_some_and(|c| contains_ci(c, needle))
        })
        .cloned()
        .collect()
}

/// Default/fallback ordering: pinned records first, then case-insensitive
/// alphabetical by name. Applied whenever no remote ranking is active and
/// again once AI results are cleared.
pub fn sort_default(records: &mut [GrantRecord]) {
    records.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GrantStatus;

    fn record(name: &str, pinned: bool, agency: Option<&str>) -> GrantRecord {
        GrantRecord {
            id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            status: GrantStatus::Active,
            is_pinned: pinned,
            grant_type: None,
            category: None,
            agency: agency.map(str::to_string),
            expiration_date: None,
        }
    }

    #[test]
    fn matches_name_agency_and_category_case_insensitively() {
        let catalog = vec![
            record("Clean Water Fund", false, None),
            record("Broadband Expansion", false, Some("Water Authority")),
            record("Road Repair", false, None),
        ];
        let hits = filter(&catalog, &NormalizedQuery::new("WATER"));
        let names: Vec<_> = hits.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Clean Water Fund", "Broadband Expansion"]);
    }

    #[test]
    fn empty_query_matches_everything() {
        let catalog = vec![record("A", false, None), record("B", false, None)];
        assert_eq!(filter(&catalog, &NormalizedQuery::new("  ")).len(), 2);
    }

    #[test]
    fn default_sort_is_pinned_first_then_alphabetical() {
        let mut records = vec![
            record("Yellow", false, None),
            record("Xylophone", false, None),
            record("Zebra", true, None),
        ];
        sort_default(&mut records);
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Zebra", "Xylophone", "Yellow"]);
    }
}
