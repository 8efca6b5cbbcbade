// =============================================================================
// Volatility Index & Risk Bucketing
// =============================================================================
//
// Volatility is the population standard deviation of step returns, in
// percent:
//   r_i = (p_i - p_{i-1}) / p_{i-1}
//   VI  = stddev(r) * 100
//
// The input order is significant and is NOT re-sorted. The engine always
// passes trade prices newest-first, so the returns are "backwards in time".

use crate::indicators::stats::standard_deviation;
use crate::types::RiskLevel;

/// Volatility index of a price window. Returns 0.0 for fewer than 2 prices.
///
/// A zero price inside the window (including a malformed one coerced to 0)
/// makes a return non-finite and the index NaN, which `risk_level` buckets as
/// `Extreme`.
pub fn volatility_index(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = prices
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();

    standard_deviation(&returns) * 100.0
}

/// Bucket a volatility index into a risk level.
pub fn risk_level(volatility: f64) -> RiskLevel {
    if volatility < 2.0 {
        RiskLevel::Low
    } else if volatility < 5.0 {
        RiskLevel::Medium
    } else if volatility < 10.0 {
        RiskLevel::High
    } else {
        RiskLevel::Extreme
    }
}
