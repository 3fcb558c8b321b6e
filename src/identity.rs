//! Identity resolution for monitored items.
//!
//! An entry's canonical identity is (product, line, station, item_name),
//! derived once per entry from whichever source is available:
//!
//! 1. stored metadata (provisioned entries),
//! 2. a 4-part `product::line::station::item` composite key,
//! 3. the bare key itself (legacy entries; context stays empty).
//!
//! Malformed keys never error — they degrade to a bare name with empty
//! context. Stored values are case-preserving; only display upper-cases
//! the context fields.

use serde::{Deserialize, Serialize};

use crate::types::ItemConfig;

/// Separator used in composite keys. Double colon avoids collisions with
/// ordinary item names.
pub const KEY_SEPARATOR: &str = "::";

const COMPOSITE_PARTS: usize = 4;

/// Where an entry's identity came from. Resolved once, not re-parsed at
/// each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// Stored `meta_data` supplied the context.
    ByMetadata,
    /// The key split into exactly four parts.
    ByCompositeKey,
    /// Bare key; no context available.
    ByBareName,
}

/// Canonical identity of a configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub product: String,
    pub line: String,
    pub station: String,
    pub item_name: String,
    pub source: IdentitySource,
}

impl ResolvedIdentity {
    /// Display form: context fields upper-cased, item name as stored.
    pub fn display(&self) -> DisplayIdentity {
        DisplayIdentity {
            product: self.product.to_uppercase(),
            line: self.line.to_uppercase(),
            station: self.station.to_uppercase(),
            item_name: self.item_name.clone(),
        }
    }
}

/// Presentation-only casing of [`ResolvedIdentity`]; stored and query
/// values stay case-preserving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayIdentity {
    pub product: String,
    pub line: String,
    pub station: String,
    pub item_name: String,
}

/// Resolve the identity of `key` -> `entry`.
pub fn resolve_identity(key: &str, entry: &ItemConfig) -> ResolvedIdentity {
    if let Some(meta) = &entry.meta_data {
        // Composite keys still carry the true item name after the last
        // separator; bare keys are the item name.
        let item_name = key
            .rsplit_once(KEY_SEPARATOR)
            .map_or(key, |(_, tail)| tail)
            .to_string();
        return ResolvedIdentity {
            product: meta.product.clone(),
            line: meta.line.clone(),
            station: meta.station.clone(),
            item_name,
            source: IdentitySource::ByMetadata,
        };
    }

    let parts: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    if parts.len() == COMPOSITE_PARTS {
        return ResolvedIdentity {
            product: parts[0].to_string(),
            line: parts[1].to_string(),
            station: parts[2].to_string(),
            item_name: parts[3].to_string(),
            source: IdentitySource::ByCompositeKey,
        };
    }

    ResolvedIdentity {
        product: String::new(),
        line: String::new(),
        station: String::new(),
        item_name: key.to_string(),
        source: IdentitySource::ByBareName,
    }
}

/// Build the storage key for an item provisioned under a full context.
///
/// Context fields are lower-cased; identity is case-insensitive by
/// convention at storage time.
pub fn composite_key(item_name: &str, product: &str, line: &str, station: &str) -> String {
    format!(
        "{}{sep}{}{sep}{}{sep}{item_name}",
        product.to_lowercase(),
        line.to_lowercase(),
        station.to_lowercase(),
        sep = KEY_SEPARATOR,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemMetadata;

    #[test]
    fn test_metadata_wins_over_key_parts() {
        let entry = ItemConfig {
            meta_data: Some(ItemMetadata {
                product: "p9".to_string(),
                line: "l9".to_string(),
                station: "s9".to_string(),
            }),
            ..ItemConfig::default()
        };
        let id = resolve_identity("p1::l1::s1::voltage", &entry);
        assert_eq!(id.source, IdentitySource::ByMetadata);
        assert_eq!(id.product, "p9");
        assert_eq!(id.item_name, "voltage", "item name comes from the key tail");
    }

    #[test]
    fn test_metadata_with_bare_key_uses_whole_key() {
        let entry = ItemConfig {
            meta_data: Some(ItemMetadata::default()),
            ..ItemConfig::default()
        };
        let id = resolve_identity("voltage", &entry);
        assert_eq!(id.item_name, "voltage");
        assert_eq!(id.product, "");
    }

    #[test]
    fn test_composite_key_splits_in_order() {
        let id = resolve_identity("prodA::line2::st7::width", &ItemConfig::default());
        assert_eq!(id.source, IdentitySource::ByCompositeKey);
        assert_eq!(
            (
                id.product.as_str(),
                id.line.as_str(),
                id.station.as_str(),
                id.item_name.as_str()
            ),
            ("prodA", "line2", "st7", "width")
        );
    }

    #[test]
    fn test_wrong_part_count_degrades_to_bare_name() {
        let id = resolve_identity("a::b::c", &ItemConfig::default());
        assert_eq!(id.source, IdentitySource::ByBareName);
        assert_eq!(id.item_name, "a::b::c");
        assert_eq!(id.station, "");
    }

    #[test]
    fn test_display_uppercases_context_only() {
        let id = resolve_identity("prodA::line2::st7::Width_mm", &ItemConfig::default());
        let display = id.display();
        assert_eq!(display.product, "PRODA");
        assert_eq!(display.station, "ST7");
        assert_eq!(display.item_name, "Width_mm");
    }

    #[test]
    fn test_composite_key_lowercases_context() {
        let key = composite_key("Width_mm", "ProdA", "Line2", "ST7");
        assert_eq!(key, "proda::line2::st7::Width_mm");
    }
}
