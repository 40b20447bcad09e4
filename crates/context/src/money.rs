//! Two-decimal money formatting.
//!
//! `{:.2}` rounds exact binary ties (x.125, x.375, x.625, x.875) to even.
//! Rendered snippets round those ties away from zero instead, so `0.125`
//! shows as `0.13`. Every other value formats exactly as `{:.2}` does.

/// Format `value` with two decimals, rounding exact ties away from zero.
pub fn to_fixed2(value: f64) -> String {
    let eighths = value * 8.0;
    let exact_tie = value.is_finite() && eighths.fract() == 0.0 && eighths % 2.0 != 0.0;
    if exact_tie {
        // quarter-cent nudge toward the outer neighbour
        format!("{:.2}", value + value.signum() * 0.0025)
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_round_away_from_zero() {
        assert_eq!(to_fixed2(0.125), "0.13");
        assert_eq!(to_fixed2(2.375), "2.38");
        assert_eq!(to_fixed2(10.625), "10.63");
        assert_eq!(to_fixed2(-0.125), "-0.13");
    }

    #[test]
    fn non_ties_match_standard_formatting() {
        assert_eq!(to_fixed2(45.5), "45.50");
        assert_eq!(to_fixed2(1.005), format!("{:.2}", 1.005));
        assert_eq!(to_fixed2(0.0), "0.00");
        assert_eq!(to_fixed2(1895.3), "1895.30");
        assert_eq!(to_fixed2(0.25), "0.25");
    }
}
