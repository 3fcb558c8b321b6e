//! Batch provisioning: raw operator input -> a validated import request.
//!
//! Input is multi-line text (one item token per line, optionally comma- or
//! tab-delimited with only the first field significant) plus a mandatory
//! product/line/station context. Validation is all-or-nothing and happens
//! before any network call; a rejected batch has no effect anywhere.

use serde::{Deserialize, Serialize};

use crate::types::{GlobalDefaults, ItemMetadata, MonitoringSide};

/// Local validation failures. Never sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisioningError {
    #[error("no valid items found in the staged text")]
    NoValidItems,
    #[error("mandatory metadata missing: product, station and line are all required")]
    MissingContext,
}

/// Raw provisioning context as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchContext {
    pub product: String,
    pub line: String,
    pub station: String,
}

impl BatchContext {
    /// Enforce completeness, then normalize: trim and lower-case. Identity
    /// is case-insensitive at storage time even though display upper-cases.
    pub fn normalized(&self) -> Result<ItemMetadata, ProvisioningError> {
        let product = self.product.trim();
        let line = self.line.trim();
        let station = self.station.trim();
        if product.is_empty() || station.is_empty() || line.is_empty() {
            return Err(ProvisioningError::MissingContext);
        }
        Ok(ItemMetadata {
            product: product.to_lowercase(),
            line: line.to_lowercase(),
            station: station.to_lowercase(),
        })
    }
}

/// Per-batch config overrides, attached only when the operator explicitly
/// enables them; absent means the backend provisions with library defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_shift_sigma: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_arl0: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_periods: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_side: Option<MonitoringSide>,
}

impl BatchOverrides {
    /// Pre-populate the override form from the current global policy.
    ///
    /// Unlike the edit path, the batch path does inherit the global
    /// `monitoring_side`, falling back to `upper` only when the global is
    /// unset.
    pub fn from_defaults(defaults: &GlobalDefaults) -> Self {
        Self {
            target_shift_sigma: defaults.target_shift_sigma,
            target_arl0: defaults.target_arl0,
            cooldown_periods: defaults.cooldown_periods,
            monitoring_side: Some(defaults.monitoring_side.unwrap_or_default()),
        }
    }
}

/// POST /api/v1/items/batch-import body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchImportRequest {
    pub items: Vec<String>,
    pub meta_data: ItemMetadata,
    /// `null` when provisioning with library-wide defaults only.
    pub config: Option<BatchOverrides>,
}

/// Extract item tokens from raw text: split lines, trim, drop blanks, take
/// the first comma/tab field, drop empties.
pub fn parse_item_tokens(raw: &str) -> Vec<String> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let token = if line.contains(',') {
                line.split(',').next().unwrap_or_default()
            } else if line.contains('\t') {
                line.split('\t').next().unwrap_or_default()
            } else {
                line
            }
            .trim();
            (!token.is_empty()).then(|| token.to_string())
        })
        .collect()
}

/// Validate and assemble a provisioning request.
///
/// Order matters: an empty token list is reported before an incomplete
/// context, and either rejection happens with no network effect.
pub fn build_import_request(
    raw_text: &str,
    context: &BatchContext,
    overrides: Option<BatchOverrides>,
) -> Result<BatchImportRequest, ProvisioningError> {
    let items = parse_item_tokens(raw_text);
    if items.is_empty() {
        return Err(ProvisioningError::NoValidItems);
    }
    let meta_data = context.normalized()?;
    Ok(BatchImportRequest {
        items,
        meta_data,
        config: overrides,
    })
}
