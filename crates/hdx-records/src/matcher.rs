//! In-memory matching for `search`.
//!
//! Free-text queries match case-insensitively as substrings of any of a
//! record's [`search_text`](crate::Record::search_text) values. Filters
//! match per field according to the field's [`FieldValue`] shape.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::record::Record;

/// Field name to wanted value. Every filter must match.
pub type Filters = BTreeMap<String, String>;

/// A filterable field value and how it is compared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Scalar field such as a status: whole-value, case-insensitive equality.
    Exact(Cow<'a, str>),
    /// Free-text field: case-insensitive substring.
    Text(&'a str),
    /// List field: matches if any element contains the wanted value.
    List(&'a [String]),
}

impl FieldValue<'_> {
    pub fn matches(&self, wanted: &str) -> bool {
        match self {
            Self::Exact(value) => value.eq_ignore_ascii_case(wanted.trim()),
            Self::Text(value) => contains_ci(value, wanted),
            Self::List(values) => values.iter().any(|v| contains_ci(v, wanted)),
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Does `record` satisfy `query` and every filter?
///
/// A blank query matches everything. A filter on a field the record type
/// does not expose never matches.
pub fn matches<R: Record>(record: &R, query: &str, filters: &Filters) -> bool {
    let query = query.trim();
    let query_ok = query.is_empty() || record.search_text().iter().any(|t| contains_ci(t, query));
    query_ok
        && filters.iter().all(|(field, wanted)| {
            record
                .filter_field(field)
                .is_some_and(|value| value.matches(wanted))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Project, ProjectStatus};
    use proptest::prelude::*;

    fn project(title: &str, status: ProjectStatus) -> Project {
        Project {
            title: title.into(),
            description: String::new(),
            status,
            tech_stack: vec!["Rust".into(), "Solidity".into()],
            ..Project::default()
        }
    }

    fn filters(pairs: &[(&str, &str)]) -> Filters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let p = project("Decentralized Identity Verification", ProjectStatus::Draft);
        assert!(matches(&p, "identity", &Filters::new()));
        assert!(matches(&p, "  IDENTITY ", &Filters::new()));
        assert!(!matches(&p, "nft", &Filters::new()));
    }

    #[test]
    fn status_filter_is_exact() {
        let p = project("x", ProjectStatus::InProgress);
        assert!(matches(&p, "", &filters(&[("status", "inprogress")])));
        assert!(!matches(&p, "", &filters(&[("status", "progress")])));
    }

    #[test]
    fn list_filter_is_substring_of_any_element() {
        let p = project("x", ProjectStatus::Draft);
        assert!(matches(&p, "", &filters(&[("techStack", "solid")])));
        assert!(!matches(&p, "", &filters(&[("techStack", "python")])));
    }

    #[test]
    fn unknown_filter_field_never_matches() {
        let p = project("x", ProjectStatus::Draft);
        assert!(!matches(&p, "", &filters(&[("colour", "red")])));
    }

    #[test]
    fn all_filters_must_match() {
        let p = project("x", ProjectStatus::Completed);
        let f = filters(&[("status", "Completed"), ("techStack", "go")]);
        assert!(!matches(&p, "", &f));
    }

    proptest! {
        #[test]
        fn blank_query_matches_everything(title in ".{0,40}", pad in " {0,3}") {
            let p = project(&title, ProjectStatus::Draft);
            prop_assert!(matches(&p, &pad, &Filters::new()));
        }

        #[test]
        fn any_title_slice_matches(title in "[a-zA-Z ]{1,40}", start in 0usize..40, len in 1usize..10) {
            let start = start.min(title.len() - 1);
            let end = (start + len).min(title.len());
            let needle = &title[start..end];
            prop_assume!(!needle.trim().is_empty());
            let p = project(&title, ProjectStatus::Draft);
            prop_assert!(matches(&p, &needle.to_uppercase(), &Filters::new()));
        }
    }
}
