//! Config Merge & Threshold Tests
//!
//! The merge engine's fallback precedence (item > global > hardcoded),
//! preservation of explicit falsy overrides, and the decision-threshold
//! contract including its undefined sentinel and round-trip stability.

use cusum_console::threshold::{decision_threshold, display_threshold, reference_k};
use cusum_console::types::{EffectiveConfig, GlobalDefaults, ItemConfig, MonitoringSide};

fn global_policy() -> GlobalDefaults {
    GlobalDefaults {
        target_shift_sigma: Some(1.0),
        target_arl0: Some(250.0),
        cooldown_periods: Some(6),
        enable_cooldown: Some(true),
        monitoring_side: Some(MonitoringSide::Lower),
        mu0: Some(0.0005),
        base_uph: Some(800.0),
        penalty_strength: Some(0.6),
    }
}

// ============================================================================
// Merge Precedence
// ============================================================================

#[test]
fn empty_item_inherits_scalar_targets_from_global() {
    let merged = EffectiveConfig::resolve(&ItemConfig::default(), &global_policy());
    assert_eq!(merged.target_shift_sigma, Some(1.0));
    assert_eq!(merged.target_arl0, Some(250.0));
    assert_eq!(merged.cooldown_periods, Some(6));
}

#[test]
fn item_values_win_over_global() {
    let entry = ItemConfig {
        target_shift_sigma: Some(2.0),
        target_arl0: Some(500.0),
        cooldown_periods: Some(12),
        ..ItemConfig::default()
    };
    let merged = EffectiveConfig::resolve(&entry, &global_policy());
    assert_eq!(merged.target_shift_sigma, Some(2.0));
    assert_eq!(merged.target_arl0, Some(500.0));
    assert_eq!(merged.cooldown_periods, Some(12));
}

#[test]
fn explicit_zero_arl0_is_not_silently_defaulted() {
    let entry = ItemConfig {
        target_arl0: Some(0.0),
        ..ItemConfig::default()
    };
    let merged = EffectiveConfig::resolve(&entry, &global_policy());
    assert_eq!(merged.target_arl0, Some(0.0), "present zero must survive");

    // And a zero ARL0 makes the threshold undefined, not zero.
    assert_eq!(merged.decision_threshold(), None);
}

#[test]
fn explicit_zero_cooldown_is_preserved() {
    let entry = ItemConfig {
        cooldown_periods: Some(0),
        ..ItemConfig::default()
    };
    let merged = EffectiveConfig::resolve(&entry, &global_policy());
    assert_eq!(merged.cooldown_periods, Some(0));
}

#[test]
fn monitoring_side_ignores_global_on_edit_path() {
    // The global policy says lower, but an entry without the field merges
    // to upper; the global value only pre-populates batch imports.
    let merged = EffectiveConfig::resolve(&ItemConfig::default(), &global_policy());
    assert_eq!(merged.monitoring_side, MonitoringSide::Upper);

    let entry = ItemConfig {
        monitoring_side: Some(MonitoringSide::Lower),
        ..ItemConfig::default()
    };
    let merged = EffectiveConfig::resolve(&entry, &global_policy());
    assert_eq!(merged.monitoring_side, MonitoringSide::Lower);
}

#[test]
fn mu0_has_no_global_fallback() {
    let merged = EffectiveConfig::resolve(&ItemConfig::default(), &global_policy());
    assert_eq!(merged.mu0, None, "absent mu0 means auto-estimated baseline");

    let entry = ItemConfig {
        mu0: Some(0.002),
        ..ItemConfig::default()
    };
    assert_eq!(
        EffectiveConfig::resolve(&entry, &global_policy()).mu0,
        Some(0.002)
    );
}

#[test]
fn base_uph_and_penalty_fall_back_per_item_not_per_global() {
    let merged = EffectiveConfig::resolve(&ItemConfig::default(), &GlobalDefaults::default());
    assert!((merged.base_uph - 500.0).abs() < f64::EPSILON);
    assert!((merged.penalty_strength - 1.0).abs() < f64::EPSILON);

    let entry = ItemConfig {
        base_uph: Some(1200.0),
        penalty_strength: Some(0.3),
        ..ItemConfig::default()
    };
    let merged = EffectiveConfig::resolve(&entry, &GlobalDefaults::default());
    assert!((merged.base_uph - 1200.0).abs() < f64::EPSILON);
    assert!((merged.penalty_strength - 0.3).abs() < f64::EPSILON);
}

#[test]
fn merge_produces_fresh_value_sources_untouched() {
    let entry = ItemConfig {
        target_arl0: Some(100.0),
        ..ItemConfig::default()
    };
    let defaults = global_policy();
    let mut merged = EffectiveConfig::resolve(&entry, &defaults);

    merged.target_arl0 = Some(999.0);
    merged.base_uph = 1.0;

    assert_eq!(entry.target_arl0, Some(100.0));
    assert_eq!(defaults.base_uph, Some(800.0));
}

// ============================================================================
// Threshold Contract
// ============================================================================

#[test]
fn threshold_reference_value_at_four_decimals() {
    // h(1.0, 250) = 2 * ln(250) = 11.0429 to 4 decimals
    let h = decision_threshold(Some(1.0), Some(250.0));
    assert_eq!(display_threshold(h), "11.0429");
}

#[test]
fn threshold_undefined_cases_are_sentinel_not_zero() {
    assert_eq!(decision_threshold(Some(0.0), Some(250.0)), None);
    assert_eq!(decision_threshold(Some(1.0), Some(1.0)), None);
    assert_eq!(decision_threshold(None, Some(250.0)), None);
    assert_eq!(display_threshold(None), "-");
}

#[test]
fn stored_value_is_not_rounded_only_display_is() {
    let h = decision_threshold(Some(1.0), Some(250.0)).unwrap();
    let displayed: f64 = display_threshold(Some(h)).parse().unwrap();
    assert!((h - 11.042_921_835_724_492).abs() < 1e-9);
    assert!((h - displayed).abs() > 0.0, "full precision differs from display");
}

#[test]
fn reference_k_pairs_with_threshold() {
    assert_eq!(reference_k(Some(1.0)), Some(0.5));
    assert_eq!(reference_k(Some(2.0)), Some(1.0));
    assert_eq!(reference_k(Some(-1.0)), None);
}

// ============================================================================
// Save / Re-fetch Round-Trip
// ============================================================================

#[test]
fn merged_view_round_trips_through_serialization() {
    let entry = ItemConfig {
        target_shift_sigma: Some(1.5),
        mu0: Some(0.001),
        ..ItemConfig::default()
    };
    let merged = EffectiveConfig::resolve(&entry, &global_policy());

    // PUT body -> stored entry -> re-merged view must reproduce the same
    // defined fields.
    let body = serde_json::to_string(&merged).unwrap();
    let stored: ItemConfig = serde_json::from_str(&body).unwrap();
    let remerged = EffectiveConfig::resolve(&stored, &global_policy());

    assert_eq!(merged, remerged);
}

#[test]
fn round_trip_keeps_absent_mu0_absent() {
    let merged = EffectiveConfig::resolve(&ItemConfig::default(), &global_policy());
    assert_eq!(merged.mu0, None);

    let body = serde_json::to_value(&merged).unwrap();
    assert!(
        body.get("mu0").is_none(),
        "absent mu0 must not serialize as null: {body}"
    );

    let stored: ItemConfig = serde_json::from_value(body).unwrap();
    let remerged = EffectiveConfig::resolve(&stored, &global_policy());
    assert_eq!(remerged.mu0, None);
}
