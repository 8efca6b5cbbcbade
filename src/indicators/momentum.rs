// =============================================================================
// Momentum Score & Signal Classification
// =============================================================================
//
// Weighted blend of price and volume movement:
//   score = 0.6 * price_change + 0.4 * volume_change      (1 decimal)
//
// Signal thresholds are exclusive: exactly 10 is `buy`, exactly 3 is
// `neutral`, and symmetrically on the negative side.

use crate::indicators::stats::round_to;
use crate::types::Signal;

const PRICE_WEIGHT: f64 = 0.6;
const VOLUME_WEIGHT: f64 = 0.4;

const STRONG_THRESHOLD: f64 = 10.0;
const THRESHOLD: f64 = 3.0;

/// Blend price and volume percentage changes into a momentum score.
pub fn momentum_score(price_change: f64, volume_change: f64) -> f64 {
    round_to(
        price_change * PRICE_WEIGHT + volume_change * VOLUME_WEIGHT,
        1,
    )
}

/// Classify a momentum score.
pub fn momentum_signal(score: f64) -> Signal {
    if score > STRONG_THRESHOLD {
        Signal::StrongBuy
    } else if score > THRESHOLD {
        Signal::Buy
    } else if score < -STRONG_THRESHOLD {
        Signal::StrongSell
    } else if score < -THRESHOLD {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}
