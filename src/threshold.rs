//! CUSUM decision-threshold calculation.
//!
//! For a target mean shift of `delta` sigma and a desired in-control average
//! run length `ARL0`, the decision threshold is
//!
//! ```text
//! h = (2 / delta^2) * ln(ARL0)
//! ```
//!
//! with the standard reference value `k = delta / 2`. The threshold is
//! undefined (not zero) outside `delta > 0`, `ARL0 > 1` — callers must
//! render that state distinctly from a numeric zero.

/// Decimal digits shown for a defined threshold. Presentation only; stored
/// and transmitted values are never rounded.
pub const DISPLAY_DECIMALS: usize = 4;

/// Placeholder rendered for an undefined threshold.
pub const UNDEFINED_DISPLAY: &str = "-";

/// Compute the decision threshold `h`, or `None` when it is undefined:
/// missing arguments, `shift <= 0`, or `arl0 <= 1`.
pub fn decision_threshold(shift: Option<f64>, arl0: Option<f64>) -> Option<f64> {
    let (shift, arl0) = (shift?, arl0?);
    if shift <= 0.0 || arl0 <= 1.0 {
        return None;
    }
    Some((2.0 / (shift * shift)) * arl0.ln())
}

/// CUSUM reference value `k = shift / 2`, undefined for non-positive shift.
pub fn reference_k(shift: Option<f64>) -> Option<f64> {
    match shift {
        Some(s) if s > 0.0 => Some(s / 2.0),
        _ => None,
    }
}

/// Render a threshold for display: 4 decimals, or `"-"` when undefined.
pub fn display_threshold(h: Option<f64>) -> String {
    h.map_or_else(
        || UNDEFINED_DISPLAY.to_string(),
        |v| format!("{v:.prec$}", prec = DISPLAY_DECIMALS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_threshold_value() {
        // 1 sigma shift at ARL0 = 250: h = 2 * ln(250)
        let h = decision_threshold(Some(1.0), Some(250.0)).unwrap();
        assert!((h - 2.0 * 250.0_f64.ln()).abs() < 1e-12);
        assert_eq!(display_threshold(Some(h)), "11.0429");
    }

    #[test]
    fn test_undefined_inputs_yield_sentinel() {
        assert_eq!(decision_threshold(Some(0.0), Some(250.0)), None);
        assert_eq!(decision_threshold(Some(-1.0), Some(250.0)), None);
        assert_eq!(decision_threshold(Some(1.0), Some(1.0)), None);
        assert_eq!(decision_threshold(Some(1.0), Some(0.5)), None);
        assert_eq!(decision_threshold(None, Some(250.0)), None);
        assert_eq!(decision_threshold(Some(1.0), None), None);
    }

    #[test]
    fn test_undefined_renders_as_dash_not_zero() {
        assert_eq!(display_threshold(None), "-");
        assert_eq!(display_threshold(Some(0.0)), "0.0000");
    }

    #[test]
    fn test_larger_shift_lowers_threshold() {
        let h1 = decision_threshold(Some(1.0), Some(370.0)).unwrap();
        let h2 = decision_threshold(Some(2.0), Some(370.0)).unwrap();
        assert!(h2 < h1);
    }

    #[test]
    fn test_reference_k_is_half_shift() {
        assert_eq!(reference_k(Some(1.0)), Some(0.5));
        assert_eq!(reference_k(Some(0.0)), None);
        assert_eq!(reference_k(None), None);
    }
}
