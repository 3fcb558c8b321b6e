//! Read-only payloads served by the backend: alert history rows, dropdown
//! option sets, and operation response envelopes.
//!
//! [`AlertRecord`] mirrors one row of the detection history store. The
//! console never writes these; it only reads ranges and shapes them for
//! display.

use serde::{Deserialize, Serialize};

use super::GlobalDefaults;

// ============================================================================
// History Rows
// ============================================================================

/// One detection sample from GET /api/v1/history, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Row id assigned by the history store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub item_name: String,

    #[serde(default)]
    pub station: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub line: Option<String>,

    /// Sample timestamp, ISO-8601.
    pub timestamp: String,

    /// Observed value at this sample.
    pub value: f64,

    /// Units-per-hour at this sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uph: Option<f64>,

    /// In-control mean (mu) in effect at this sample.
    pub baseline: f64,

    /// Standard deviation (sigma) in effect at this sample.
    pub std: f64,

    /// CUSUM reference value in effect at this sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_value: Option<f64>,

    /// Decision threshold computed at this sample.
    pub h_value: f64,

    /// Upper cumulative sum statistic.
    pub s_plus: f64,

    /// Lower cumulative sum statistic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_minus: Option<f64>,

    pub is_alert: bool,

    /// Which side tripped, when `is_alert` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_side: Option<String>,
}

// ============================================================================
// Dropdown Options
// ============================================================================

/// GET /api/v1/options payload: context-filtered dropdown population.
///
/// The backend narrows each dimension by the *other* selected dimensions;
/// the console treats the lists as opaque and re-requests on context change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSets {
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub stations: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub lines: Vec<String>,
}

// ============================================================================
// Response Envelopes
// ============================================================================

/// GET /health payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

/// Generic `{ "message": ... }` acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// PUT /api/v1/configs/global response: the acknowledgment plus the policy
/// now in force, echoed back by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalUpdateResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_global: Option<GlobalDefaults>,
}

/// POST /api/v1/configs/batch-delete response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteResponse {
    pub message: String,
    /// Per-key failure details for a partial failure.
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub deleted_count: u64,
}

/// POST /api/v1/items/batch-import response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchImportResponse {
    pub message: String,
    #[serde(default)]
    pub total_requested: u64,
}
