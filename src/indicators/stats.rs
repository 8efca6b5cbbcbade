// =============================================================================
// Basic Statistics — percentage change, dispersion, concentration, parsing
// =============================================================================

/// Sum seeded with +0.0, so an empty input totals 0 rather than -0.
pub fn total(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0, |acc, v| acc + v)
}

/// Percentage change from `old` to `new`.
///
/// Returns 0.0 when `old` is zero instead of dividing by it.
pub fn percentage_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        return 0.0;
    }
    ((new - old) / old) * 100.0
}

/// Population standard deviation (divides by `n`, not `n - 1`).
///
/// Returns 0.0 for an empty slice.
pub fn standard_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = total(values.iter().copied()) / n;
    let variance = total(values.iter().map(|v| (v - mean).powi(2))) / n;

    variance.sqrt()
}

/// Share of the three largest entries in the total, as a percentage.
///
/// Returns 0.0 when the shares sum to zero.
pub fn concentration_ratio(shares: &[f64]) -> f64 {
    let sum = total(shares.iter().copied());
    if sum == 0.0 {
        return 0.0;
    }

    let mut sorted = shares.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let top3 = total(sorted.iter().take(3).copied());

    (top3 / sum) * 100.0
}

/// Parse a decimal string, coercing anything unparsable to 0.0.
///
/// Non-finite results ("inf", "NaN") are also coerced so that one malformed
/// record cannot poison a depth or volume sum.
pub fn parse_safe_number(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Round `value` to `digits` fraction digits. Ties round toward +inf
/// (`round_to(-2.25, 1) == -2.2`) and the result is never -0.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor + 0.5).floor() / factor
}

/// Fixed-point rendering with `digits` fraction digits.
///
/// An exact binary tie rounds away from zero (`0.125` renders as `"0.13"`),
/// where `format!` would round it to even. Negative zero renders unsigned.
pub fn to_fixed(value: f64, digits: usize) -> String {
    const EXTRA_DIGITS: usize = 30;

    let value = value + 0.0;
    let magnitude = value.abs();
    if !magnitude.is_finite() {
        return format!("{value:.digits$}");
    }

    let exact = format!("{:.*}", digits + EXTRA_DIGITS, magnitude);
    let tail = &exact[exact.len() - EXTRA_DIGITS..];
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return format!("{value:.digits$}");
    }

    let factor = 10f64.powi(digits as i32);
    let rounded = (magnitude * factor).ceil() / factor;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{rounded:.digits$}")
}

/// Human-readable magnitude with a K/M/B suffix and two fraction digits.
pub fn format_compact(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_change_zero_base() {
        assert_eq!(percentage_change(0.0, 42.0), 0.0);
        assert_eq!(percentage_change(0.0, -3.5), 0.0);
    }

    #[test]
    fn percentage_change_basic() {
        assert!((percentage_change(100.0, 110.0) - 10.0).abs() < 1e-10);
        assert!((percentage_change(200.0, 150.0) + 25.0).abs() < 1e-10);
    }

    #[test]
    fn std_dev_empty_and_constant() {
        assert_eq!(standard_deviation(&[]), 0.0);
        assert_eq!(standard_deviation(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn std_dev_is_population() {
        // Population: sqrt(2/3) = 0.8165; sample would be 1.0.
        let sd = standard_deviation(&[1.0, 2.0, 3.0]);
        assert!((sd - 0.816_496_580_927_726).abs() < 1e-9, "got {sd}");
    }

    #[test]
    fn concentration_ratio_top_three() {
        // Unsorted input: top 3 are 40, 30, 20 out of 100.
        let ratio = concentration_ratio(&[10.0, 40.0, 20.0, 30.0]);
        assert!((ratio - 90.0).abs() < 1e-10);
    }

    #[test]
    fn concentration_ratio_zero_total() {
        assert_eq!(concentration_ratio(&[]), 0.0);
        assert_eq!(concentration_ratio(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn concentration_ratio_fewer_than_three() {
        assert!((concentration_ratio(&[3.0, 1.0]) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn parse_safe_number_coerces_garbage() {
        assert_eq!(parse_safe_number("25.44"), 25.44);
        assert_eq!(parse_safe_number(" 7 "), 7.0);
        assert_eq!(parse_safe_number("abc"), 0.0);
        assert_eq!(parse_safe_number(""), 0.0);
        assert_eq!(parse_safe_number("NaN"), 0.0);
        assert_eq!(parse_safe_number("inf"), 0.0);
    }

    #[test]
    fn round_to_digits() {
        assert_eq!(round_to(0.039_308, 4), 0.0393);
        assert_eq!(round_to(12.345_6, 1), 12.3);
    }

    #[test]
    fn round_to_ties_go_up() {
        assert_eq!(round_to(2.25, 1), 2.3);
        assert_eq!(round_to(-2.25, 1), -2.2);
        assert_eq!(round_to(-0.5, 0), 0.0);
    }

    #[test]
    fn round_to_never_negative_zero() {
        assert!(round_to(-0.0, 2).is_sign_positive());
        assert!(round_to(-0.001, 1).is_sign_positive());
    }

    #[test]
    fn total_of_nothing_is_positive_zero() {
        let t = total(std::iter::empty());
        assert_eq!(t, 0.0);
        assert!(t.is_sign_positive());
        assert_eq!(total([1.5, 2.5]), 4.0);
    }

    #[test]
    fn to_fixed_matches_plain_format_off_ties() {
        assert_eq!(to_fixed(2544.0, 2), "2544.00");
        assert_eq!(to_fixed(25.45, 6), "25.450000");
        // 1.005 is stored just below the tie.
        assert_eq!(to_fixed(1.005, 2), "1.00");
    }

    #[test]
    fn to_fixed_ties_round_away_from_zero() {
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(-0.125, 2), "-0.13");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(0.625, 2), "0.63");
    }

    #[test]
    fn to_fixed_passes_non_finite_through() {
        assert_eq!(to_fixed(f64::NAN, 2), "NaN");
        assert_eq!(to_fixed(f64::INFINITY, 2), "inf");
    }

    #[test]
    fn to_fixed_drops_sign_of_zero() {
        assert_eq!(to_fixed(-0.0, 2), "0.00");
        assert_eq!(to_fixed(-0.0, 6), "0.000000");
    }

    #[test]
    fn format_compact_suffixes() {
        assert_eq!(format_compact(12_500_000.0), "12.50M");
        assert_eq!(format_compact(2_000_000_000.0), "2.00B");
        assert_eq!(format_compact(1_500.0), "1.50K");
        assert_eq!(format_compact(12.0), "12.00");
    }
}
