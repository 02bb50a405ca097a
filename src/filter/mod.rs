//! Name and metadata filtering
//!
//! Container and blob names are matched by case-sensitive substring.
//! Metadata is matched against an OR-group of `key:value` rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Blob metadata as listed: user-defined keys with optional values
pub type Metadata = BTreeMap<String, Option<String>>;

/// A single metadata rule: the key must exist and its value must contain `value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub value: String,
}

impl Filter {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    fn accepts(&self, metadata: &Metadata) -> bool {
        match metadata.get(&self.key) {
            Some(Some(actual)) => actual.contains(&self.value),
            _ => false,
        }
    }
}

/// Returns true if any filter in the group accepts the metadata.
///
/// Empty metadata or an empty group never match; callers skip this check
/// entirely when no filter group is configured.
pub fn matches(metadata: &Metadata, filters: &[Filter]) -> bool {
    if metadata.is_empty() || filters.is_empty() {
        return false;
    }

    filters.iter().any(|filter| filter.accepts(metadata))
}

/// Parse `key:value` tokens, splitting on the first colon.
///
/// Tokens without a colon are dropped.
pub fn parse_filters<S: AsRef<str>>(tokens: &[S]) -> Vec<Filter> {
    tokens
        .iter()
        .filter_map(|token| {
            let token = token.as_ref();
            match token.split_once(':') {
                Some((key, value)) => Some(Filter::new(key, value)),
                None => {
                    debug!("Ignoring metadata filter without ':' separator: {}", token);
                    None
                }
            }
        })
        .collect()
}

/// Case-sensitive substring filter; empty means match all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter(Option<String>);

impl NameFilter {
    pub fn new(pattern: Option<String>) -> Self {
        Self(pattern.filter(|p| !p.is_empty()))
    }

    pub fn accepts(&self, name: &str) -> bool {
        match &self.0 {
            Some(pattern) => name.contains(pattern.as_str()),
            None => true,
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, Option<&str>)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_matches_substring_of_value() {
        let meta = metadata(&[("team", Some("infra"))]);
        assert!(matches(&meta, &[Filter::new("team", "inf")]));
        assert!(!matches(&meta, &[Filter::new("team", "ops")]));
    }

    #[test]
    fn test_matches_empty_inputs() {
        let meta = metadata(&[("team", Some("infra"))]);
        assert!(!matches(&Metadata::new(), &[Filter::new("team", "")]));
        assert!(!matches(&meta, &[]));
    }

    #[test]
    fn test_matches_any_filter_in_group() {
        let meta = metadata(&[("env", Some("prod")), ("owner", Some("alice"))]);
        let group = vec![Filter::new("env", "dev"), Filter::new("owner", "ali")];
        assert!(matches(&meta, &group));
    }

    #[test]
    fn test_missing_key_or_absent_value_does_not_match() {
        let meta = metadata(&[("env", None)]);
        assert!(!matches(&meta, &[Filter::new("env", "")]));
        assert!(!matches(&meta, &[Filter::new("team", "")]));
    }

    #[test]
    fn test_parse_filters_splits_on_first_colon() {
        let filters = parse_filters(&["env:prod:east", "team:infra"]);
        assert_eq!(
            filters,
            vec![Filter::new("env", "prod:east"), Filter::new("team", "infra")]
        );
    }

    #[test]
    fn test_parse_filters_drops_tokens_without_colon() {
        let filters = parse_filters(&["novalue", "", "k:"]);
        assert_eq!(filters, vec![Filter::new("k", "")]);
    }

    #[test]
    fn test_name_filter_is_case_sensitive() {
        let filter = NameFilter::new(Some("prod".to_string()));
        assert!(filter.accepts("prod-logs"));
        assert!(!NameFilter::new(Some("PROD".to_string())).accepts("prod-logs"));
    }

    #[test]
    fn test_empty_name_filter_matches_all() {
        assert!(NameFilter::new(None).accepts("anything"));
        assert!(NameFilter::new(Some(String::new())).accepts("anything"));
        assert_eq!(NameFilter::new(Some(String::new())).pattern(), None);
    }
}
