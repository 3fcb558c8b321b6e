//! Monitoring configuration types and the defaults/override merge engine.
//!
//! A monitored item is keyed either by a bare item name or by a composite
//! `product::line::station::item` key. Its stored configuration
//! ([`ItemConfig`]) is partial by design: any absent field inherits from the
//! library-wide [`GlobalDefaults`] (or a hardcoded fallback) at edit time,
//! producing an [`EffectiveConfig`]. The merge is value-level, not
//! truthiness-level: an explicit `0` stored on an item is an override and
//! must survive the merge.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Enums
// ============================================================================

/// Which side of the baseline the CUSUM statistic accumulates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MonitoringSide {
    /// Alert on upward shifts (the default for yield-style defect rates).
    #[default]
    Upper,
    /// Alert on downward shifts.
    Lower,
}

impl MonitoringSide {
    /// Parse a stored string, returning `None` for values the console does
    /// not write (the detection pipeline historically also emitted `"both"`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "upper" => Some(Self::Upper),
            "lower" => Some(Self::Lower),
            _ => None,
        }
    }
}

impl std::fmt::Display for MonitoringSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upper => write!(f, "upper"),
            Self::Lower => write!(f, "lower"),
        }
    }
}

/// Kind of quantity an item monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// A process parameter (dimension, pressure, ...).
    Parameter,
    /// A yield / defect-rate figure.
    Yield,
}

/// Lenient deserializer for [`MonitoringSide`]: foreign values stored by
/// other writers must not abort an entire config snapshot load.
fn side_lenient<'de, D>(deserializer: D) -> Result<Option<MonitoringSide>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(MonitoringSide::parse))
}

// ============================================================================
// Stored Configuration
// ============================================================================

/// Identity context attached to an entry at provisioning time.
///
/// All three fields are lowercase-normalized at storage time; absent fields
/// resolve to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub station: String,
}

/// Per-item stored configuration, as persisted by the backend.
///
/// Every field is optional: absence means "inherit" and is distinct from an
/// explicit value. Unknown fields written by older backends are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    /// Mean shift to detect, in sigma units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_shift_sigma: Option<f64>,

    /// Desired in-control average run length between false alarms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_arl0: Option<f64>,

    /// Samples to suppress re-alerting after a detected shift.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_periods: Option<u32>,

    #[serde(
        default,
        deserialize_with = "side_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub monitoring_side: Option<MonitoringSide>,

    /// Fixed in-control mean. Absent means "auto-estimate baseline".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu0: Option<f64>,

    /// Units-per-hour baseline capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uph: Option<f64>,

    /// Penalty strength applied by the detector (1.0 = strict).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_strength: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,

    /// Identity context; entries provisioned before composite keys existed
    /// carry none and fall back to key parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<ItemMetadata>,
}

/// Library-wide default policy, a backend singleton.
///
/// Same shape as [`ItemConfig`] minus identity. Saving it is documented to
/// broadcast the new policy to the live detection pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_shift_sigma: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_arl0: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_periods: Option<u32>,

    /// Whether the detection pipeline applies alert suppression at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_cooldown: Option<bool>,

    #[serde(
        default,
        deserialize_with = "side_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub monitoring_side: Option<MonitoringSide>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu0: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uph: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_strength: Option<f64>,
}

// ============================================================================
// Merge Engine
// ============================================================================

/// Fallback when neither the item nor a hardcoded rule supplies `base_uph`.
pub const BASE_UPH_FALLBACK: f64 = 500.0;

/// Fallback penalty strength (strict).
pub const PENALTY_STRENGTH_FALLBACK: f64 = 1.0;

/// Fully resolved parameter set for an item, produced for the edit view and
/// sent back verbatim on save.
///
/// A fresh value: mutating it never touches the source [`ItemConfig`] or the
/// [`GlobalDefaults`] until an explicit save round-trips it through the
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_shift_sigma: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_arl0: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_periods: Option<u32>,

    pub monitoring_side: MonitoringSide,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu0: Option<f64>,

    pub base_uph: f64,

    pub penalty_strength: f64,
}

impl EffectiveConfig {
    /// Overlay `entry` onto `defaults`.
    ///
    /// Item values win whenever present, including explicit zeros; only an
    /// absent field falls back. Two fields deliberately ignore the global
    /// policy: `monitoring_side` (the edit path hardcodes `upper`; the
    /// global value only pre-populates batch imports) and `mu0` (absence
    /// means auto-estimated baseline, which no global value may override).
    pub fn resolve(entry: &ItemConfig, defaults: &GlobalDefaults) -> Self {
        Self {
            target_shift_sigma: entry.target_shift_sigma.or(defaults.target_shift_sigma),
            target_arl0: entry.target_arl0.or(defaults.target_arl0),
            cooldown_periods: entry.cooldown_periods.or(defaults.cooldown_periods),
            monitoring_side: entry.monitoring_side.unwrap_or_default(),
            mu0: entry.mu0,
            base_uph: entry.base_uph.unwrap_or(BASE_UPH_FALLBACK),
            penalty_strength: entry.penalty_strength.unwrap_or(PENALTY_STRENGTH_FALLBACK),
        }
    }

    /// CUSUM decision threshold for the resolved targets, if defined.
    pub fn decision_threshold(&self) -> Option<f64> {
        crate::threshold::decision_threshold(self.target_shift_sigma, self.target_arl0)
    }
}

// ============================================================================
// Config Table (order-preserving key -> entry mapping)
// ============================================================================

/// The full configuration set, keyed by bare or composite item key.
///
/// The backend serves this as a JSON object; iteration order of that object
/// is part of the display contract (the list view shows entries in source
/// order, with no extra sorting), so deserialization preserves document
/// order instead of going through a sorted map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTable {
    entries: Vec<(String, ItemConfig)>,
}

impl ConfigTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemConfig)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&ItemConfig> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or replace in place; new keys append, preserving order.
    pub fn insert(&mut self, key: String, entry: ItemConfig) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((key, entry)),
        }
    }
}

impl FromIterator<(String, ItemConfig)> for ConfigTable {
    fn from_iter<I: IntoIterator<Item = (String, ItemConfig)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (key, entry) in iter {
            table.insert(key, entry);
        }
        table
    }
}

impl Serialize for ConfigTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ConfigTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = ConfigTable;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of item key to config entry")
            }

            // MapAccess yields entries in document order regardless of the
            // target container, which is exactly what the list view needs.
            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, entry)) = access.next_entry::<String, ItemConfig>()? {
                    entries.push((key, entry));
                }
                Ok(ConfigTable { entries })
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

/// GET /api/v1/configs payload: the full item mapping plus the global policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub item_configs: ConfigTable,
    #[serde(default)]
    pub global_defaults: GlobalDefaults,
}

// ============================================================================
// Tests
// ============================================================================
