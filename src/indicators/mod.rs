// =============================================================================
// Market Indicators Module
// =============================================================================
//
// Pure, side-effect-free numeric helpers used by the analytics engine. None
// of these functions fail: degenerate input (empty windows, zero divisors,
// malformed decimal strings) collapses to 0 so that a single bad record can
// never abort an aggregate view.

pub mod liquidity;
pub mod momentum;
pub mod stats;
pub mod volatility;

pub use liquidity::liquidity_score;
pub use momentum::{momentum_score, momentum_signal};
pub use stats::{
    concentration_ratio, format_compact, parse_safe_number, percentage_change, round_to,
    to_fixed, total,
};
pub use volatility::{risk_level, volatility_index};
