//! Predicate filtering over the configuration set.
//!
//! A pure function of (table, filter): no hidden state, recomputed on every
//! filter change. Matching is case-insensitive substring containment against
//! each entry's resolved identity; an empty predicate matches everything.
//! Output preserves the table's source iteration order.

use serde::{Deserialize, Serialize};

use crate::identity::{resolve_identity, ResolvedIdentity};
use crate::types::{ConfigTable, ItemConfig};

/// Four optional substring predicates over the resolved identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFilter {
    pub item: String,
    pub product: String,
    pub station: String,
    pub line: String,
}

impl ConfigFilter {
    pub fn is_empty(&self) -> bool {
        self.item.is_empty()
            && self.product.is_empty()
            && self.station.is_empty()
            && self.line.is_empty()
    }

    /// Whether `identity` passes all supplied predicates.
    pub fn matches(&self, identity: &ResolvedIdentity) -> bool {
        contains_fold(&identity.item_name, &self.item)
            && contains_fold(&identity.product, &self.product)
            && contains_fold(&identity.station, &self.station)
            && contains_fold(&identity.line, &self.line)
    }
}

/// Case-insensitive substring containment; an empty needle matches all.
fn contains_fold(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// One entry of the filtered view, with its identity resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredEntry<'a> {
    pub key: &'a str,
    pub config: &'a ItemConfig,
    pub identity: ResolvedIdentity,
}

/// Filter `table` by `filter`, preserving source order.
pub fn filter_entries<'a>(table: &'a ConfigTable, filter: &ConfigFilter) -> Vec<FilteredEntry<'a>> {
    table
        .iter()
        .filter_map(|(key, config)| {
            let identity = resolve_identity(key, config);
            filter.matches(&identity).then_some(FilteredEntry {
                key,
                config,
                identity,
            })
        })
        .collect()
}

/// Key set currently passing the filter — the exact "select all" target.
pub fn filtered_keys(table: &ConfigTable, filter: &ConfigFilter) -> Vec<String> {
    filter_entries(table, filter)
        .into_iter()
        .map(|entry| entry.key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ConfigTable {
        [
            ("proda::l1::ST-07::width", ItemConfig::default()),
            ("proda::l2::st-08::height", ItemConfig::default()),
            ("legacy_item", ItemConfig::default()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_empty_filter_returns_all_in_source_order() {
        let table = table();
        let out = filter_entries(&table, &ConfigFilter::default());
        let keys: Vec<&str> = out.iter().map(|e| e.key).collect();
        assert_eq!(
            keys,
            vec!["proda::l1::ST-07::width", "proda::l2::st-08::height", "legacy_item"]
        );
    }

    #[test]
    fn test_station_substring_is_case_insensitive() {
        let table = table();
        let filter = ConfigFilter {
            station: "st-0".to_string(),
            ..ConfigFilter::default()
        };
        let keys: Vec<&str> = filter_entries(&table, &filter).iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["proda::l1::ST-07::width", "proda::l2::st-08::height"]);
    }

    #[test]
    fn test_all_predicates_must_match() {
        let table = table();
        let filter = ConfigFilter {
            station: "st-07".to_string(),
            item: "height".to_string(),
            ..ConfigFilter::default()
        };
        assert!(filter_entries(&table, &filter).is_empty());
    }

    #[test]
    fn test_bare_entries_match_only_on_item() {
        let table = table();
        let by_item = ConfigFilter {
            item: "LEGACY".to_string(),
            ..ConfigFilter::default()
        };
        assert_eq!(filtered_keys(&table, &by_item), vec!["legacy_item"]);

        // A bare entry has empty context, so any context predicate excludes it.
        let by_product = ConfigFilter {
            item: "legacy".to_string(),
            product: "proda".to_string(),
            ..ConfigFilter::default()
        };
        assert!(filtered_keys(&table, &by_product).is_empty());
    }
}
