//! Alert-history querying and chart-series shaping.
//!
//! The history store is external and read-only; this module builds its
//! query parameters (widening local dates to full-day bounds) and maps the
//! returned chronological [`AlertRecord`] sequence into display-ready
//! parallel series. Rendering itself is out of scope — the shaping contract
//! ends at the series.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::AlertRecord;

/// Hours of context fetched on either side of a drill-down record; wide
/// enough to cover 30+ sampling periods at production cadence.
pub const DETAIL_WINDOW_HOURS: i64 = 48;

/// Alert rows shown in the dashboard table, newest first.
pub const RECENT_ALERTS_CAP: usize = 100;

/// Local validation failures for a history search. Never sent to the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryQueryError {
    #[error("an item name is required to search history")]
    MissingItem,
    #[error("select a complete context (station, product, line) to ensure data uniqueness")]
    IncompleteContext,
}

// ============================================================================
// Query Building
// ============================================================================

/// Parameters for GET /api/v1/history.
///
/// `start_time`/`end_time` accept either a local date (`YYYY-MM-DD`, widened
/// to the day's `T00:00:00`/`T23:59:59` bounds) or a full timestamp (passed
/// through untouched, as the drill-down window does).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub item_name: Option<String>,
    pub station: Option<String>,
    pub product: Option<String>,
    pub line: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub limit: Option<u32>,
}

impl HistoryQuery {
    /// Strict dashboard precondition: an item plus the full
    /// station/product/line context, checked before any network call.
    pub fn validate_context(&self) -> Result<(), HistoryQueryError> {
        if self.item_name.as_deref().map_or(true, str::is_empty) {
            return Err(HistoryQueryError::MissingItem);
        }
        let complete = [&self.station, &self.product, &self.line]
            .into_iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()));
        if complete {
            Ok(())
        } else {
            Err(HistoryQueryError::IncompleteContext)
        }
    }

    /// Encode as query pairs, skipping empty fields and widening bare dates.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        for (name, value) in [
            ("item_name", &self.item_name),
            ("station", &self.station),
            ("product", &self.product),
            ("line", &self.line),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((name, value.to_string()));
            }
        }
        if let Some(start) = self.start_time.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("start_time", widen_start(start)));
        }
        if let Some(end) = self.end_time.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("end_time", widen_end(end)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Widen a bare local date to the start of the day; full timestamps pass
/// through.
pub fn widen_start(value: &str) -> String {
    if value.contains('T') {
        value.to_string()
    } else {
        format!("{value}T00:00:00")
    }
}

/// Widen a bare local date to the end of the day; full timestamps pass
/// through.
pub fn widen_end(value: &str) -> String {
    if value.contains('T') {
        value.to_string()
    } else {
        format!("{value}T23:59:59")
    }
}

/// Time bounds for a drill-down context fetch around one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailWindow {
    pub start_time: String,
    pub end_time: String,
}

/// Compute the +/- `hours` window around a record timestamp. `None` when
/// the timestamp does not parse — the drill-down degrades to no context
/// rather than erroring.
pub fn detail_window(center_timestamp: &str, hours: i64) -> Option<DetailWindow> {
    let center = parse_timestamp(center_timestamp)?;
    let half = Duration::hours(hours);
    let fmt = "%Y-%m-%dT%H:%M:%S";
    Some(DetailWindow {
        start_time: (center - half).format(fmt).to_string(),
        end_time: (center + half).format(fmt).to_string(),
    })
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    // History rows carry local timestamps without an offset; tolerate a
    // trailing Z or fractional seconds from other writers.
    let raw = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

// ============================================================================
// Series Shaping
// ============================================================================

/// Display-ready parallel series for the main and baseline charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub timestamps: Vec<String>,
    pub values: Vec<f64>,
    pub thresholds: Vec<f64>,
    pub cusum: Vec<f64>,
    pub baselines: Vec<f64>,
    pub stds: Vec<f64>,
}

impl ChartSeries {
    /// Shape a chronological record sequence into parallel series.
    pub fn from_records(records: &[AlertRecord]) -> Self {
        let mut series = Self {
            timestamps: Vec::with_capacity(records.len()),
            values: Vec::with_capacity(records.len()),
            thresholds: Vec::with_capacity(records.len()),
            cusum: Vec::with_capacity(records.len()),
            baselines: Vec::with_capacity(records.len()),
            stds: Vec::with_capacity(records.len()),
        };
        for record in records {
            series.timestamps.push(record.timestamp.clone());
            series.values.push(record.value);
            series.thresholds.push(record.h_value);
            series.cusum.push(record.s_plus);
            series.baselines.push(record.baseline);
            series.stds.push(record.std);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Alert rows for the dashboard table: reverse chronological, capped.
pub fn recent_alerts(records: &[AlertRecord], cap: usize) -> Vec<&AlertRecord> {
    records
        .iter()
        .filter(|record| record.is_alert)
        .rev()
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: &str, value: f64, is_alert: bool) -> AlertRecord {
        AlertRecord {
            id: None,
            item_name: "width".to_string(),
            station: None,
            product: None,
            line: None,
            timestamp: timestamp.to_string(),
            value,
            uph: None,
            baseline: 0.5,
            std: 0.1,
            k_value: None,
            h_value: 11.09,
            s_plus: 0.0,
            s_minus: None,
            is_alert,
            alert_side: None,
        }
    }

    #[test]
    fn test_bare_dates_widened_to_day_bounds() {
        let query = HistoryQuery {
            item_name: Some("width".to_string()),
            start_time: Some("2026-08-01".to_string()),
            end_time: Some("2026-08-02".to_string()),
            limit: Some(20000),
            ..HistoryQuery::default()
        };
        let pairs = query.query_pairs();
        assert!(pairs.contains(&("start_time", "2026-08-01T00:00:00".to_string())));
        assert!(pairs.contains(&("end_time", "2026-08-02T23:59:59".to_string())));
        assert!(pairs.contains(&("limit", "20000".to_string())));
    }

    #[test]
    fn test_full_timestamps_pass_through() {
        let query = HistoryQuery {
            start_time: Some("2026-08-01T12:30:00".to_string()),
            ..HistoryQuery::default()
        };
        let pairs = query.query_pairs();
        assert!(pairs.contains(&("start_time", "2026-08-01T12:30:00".to_string())));
    }

    #[test]
    fn test_context_validation() {
        let mut query = HistoryQuery::default();
        assert_eq!(query.validate_context(), Err(HistoryQueryError::MissingItem));

        query.item_name = Some("width".to_string());
        query.station = Some("st7".to_string());
        assert_eq!(
            query.validate_context(),
            Err(HistoryQueryError::IncompleteContext)
        );

        query.product = Some("proda".to_string());
        query.line = Some("l1".to_string());
        assert_eq!(query.validate_context(), Ok(()));
    }

    #[test]
    fn test_detail_window_spans_96_hours() {
        let window = detail_window("2026-08-03T12:00:00", DETAIL_WINDOW_HOURS).unwrap();
        assert_eq!(window.start_time, "2026-08-01T12:00:00");
        assert_eq!(window.end_time, "2026-08-05T12:00:00");
    }

    #[test]
    fn test_detail_window_unparseable_is_none() {
        assert_eq!(detail_window("not-a-time", DETAIL_WINDOW_HOURS), None);
    }

    #[test]
    fn test_series_shape_matches_input_order() {
        let records = vec![
            record("2026-08-01T00:00:00", 0.4, false),
            record("2026-08-01T01:00:00", 0.9, true),
        ];
        let series = ChartSeries::from_records(&records);
        assert_eq!(series.len(), 2);
        assert_eq!(series.values, vec![0.4, 0.9]);
        assert_eq!(series.timestamps[0], "2026-08-01T00:00:00");
    }

    #[test]
    fn test_recent_alerts_reversed_and_capped() {
        let records: Vec<AlertRecord> = (0..5)
            .map(|i| record(&format!("2026-08-01T0{i}:00:00"), 0.9, i % 2 == 1))
            .collect();
        let alerts = recent_alerts(&records, 1);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].timestamp, "2026-08-01T03:00:00", "newest alert first");
    }
}
