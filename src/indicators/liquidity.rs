// =============================================================================
// Liquidity Score — orderbook depth discounted by spread
// =============================================================================
//
//   total   = bid_depth + ask_depth
//   penalty = max(0, 1 - spread / 100)
//   score   = min(100, total / 10_000 * penalty * 100)      (1 decimal)
//
// A spread of 100 or more zeroes the score regardless of depth.

use crate::indicators::stats::round_to;

/// Depth at which the score saturates when the spread is zero.
const SATURATION_DEPTH: f64 = 10_000.0;

/// Liquidity score in `[0, 100]`, rounded to one decimal.
pub fn liquidity_score(bid_depth: f64, ask_depth: f64, spread: f64) -> f64 {
    let total_depth = bid_depth + ask_depth;
    let spread_penalty = (1.0 - spread / 100.0).max(0.0);

    let score = (total_depth / SATURATION_DEPTH * spread_penalty * 100.0).min(100.0);
    round_to(score, 1)
}
