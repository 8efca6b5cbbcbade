// =============================================================================
// Derived analytic views
// =============================================================================
//
// Value objects produced by the analytics engine and served as-is by the API.
// Wire names are camelCase. Prices render with 6 fraction digits, quantities
// with 4, totals and volumes with 2.
// =============================================================================

use std::sync::Arc;

use serde::Serialize;

use crate::indicators::to_fixed;
use crate::types::{ConcentrationLevel, MarketKind, RiskLevel, Signal, VolumeTrend};

// ── Rendering helpers ──────────────────────────────────────────────────────

pub fn render_price(v: f64) -> String {
    to_fixed(v, 6)
}

pub fn render_quantity(v: f64) -> String {
    to_fixed(v, 4)
}

pub fn render_total(v: f64) -> String {
    to_fixed(v, 2)
}

// ── Overview ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub market_id: String,
    pub ticker: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub current_price: String,
    pub price_change_24h: f64,
    pub volume_24h: String,
    pub market_type: MarketKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    pub total_markets: usize,
    pub total_volume_24h: String,
    pub top_gainers: Vec<MarketSummary>,
    pub top_losers: Vec<MarketSummary>,
    pub market_health_score: u32,
}

// ── Per-market analytics ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    pub current: String,
    pub high_24h: String,
    pub low_24h: String,
    pub change_24h: f64,
    pub change_percent_24h: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMetrics {
    pub volume_24h: String,
    pub volume_trend: VolumeTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalytics {
    pub market_id: String,
    pub ticker: String,
    pub price_stats: PriceStats,
    pub volume_metrics: VolumeMetrics,
    pub liquidity_score: f64,
    pub volatility_index: f64,
}

// ── Orderbook depth ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLevel {
    pub price: String,
    pub quantity: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderbookDepth {
    pub market_id: String,
    pub ticker: String,
    pub spread: String,
    pub spread_percent: f64,
    pub bid_depth: Vec<PriceLevel>,
    pub ask_depth: Vec<PriceLevel>,
    pub liquidity_concentration: f64,
}

// ── Signals ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentumSignal {
    pub market_id: String,
    pub ticker: String,
    pub momentum_score: f64,
    pub price_change_24h: f64,
    pub volume_change_24h: f64,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityAlert {
    pub market_id: String,
    pub ticker: String,
    pub volatility_index: f64,
    pub risk_level: RiskLevel,
    pub price_deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityOpportunity {
    pub market_id: String,
    pub ticker: String,
    pub liquidity_score: f64,
    pub spread: String,
    pub spread_percent: f64,
    pub estimated_slippage: f64,
}

// ── Risk ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeConcentration {
    pub top_market_share: f64,
    pub top3_market_share: f64,
    pub top10_market_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationRisk {
    pub volume_concentration: VolumeConcentration,
    pub concentration_ratio: f64,
    pub risk_level: ConcentrationLevel,
    pub dominant_markets: Vec<MarketSummary>,
}

// =============================================================================
// Cache payload
// =============================================================================

/// Everything the engine stores in its cache. Handles are `Arc` so a cache
/// hit never deep-copies a view.
#[derive(Debug, Clone)]
pub enum CachedView {
    Overview(Arc<MarketOverview>),
    Analytics(Arc<MarketAnalytics>),
    Depth(Arc<OrderbookDepth>),
    Momentum(Arc<Vec<MomentumSignal>>),
    Volatility(Arc<Vec<VolatilityAlert>>),
    Liquidity(Arc<Vec<LiquidityOpportunity>>),
    Concentration(Arc<ConcentrationRisk>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_precisions() {
        assert_eq!(render_price(25.45), "25.450000");
        assert_eq!(render_quantity(100.0), "100.0000");
        assert_eq!(render_total(25.44 * 100.0), "2544.00");
        assert_eq!(render_price(25.45 - 25.44), "0.010000");
    }

    #[test]
    fn rendering_ties_and_negative_zero() {
        assert_eq!(render_total(0.125), "0.13");
        assert_eq!(render_total(-0.0), "0.00");
        assert_eq!(render_quantity(-0.0), "0.0000");
    }

    #[test]
    fn wire_names_are_camel_case() {
        let s = MarketSummary {
            market_id: "0x1".into(),
            ticker: "INJ/USDT".into(),
            base_asset: "INJ".into(),
            quote_asset: "USDT".into(),
            current_price: "25.450000".into(),
            price_change_24h: 8.52,
            volume_24h: "1250000.00".into(),
            market_type: MarketKind::Spot,
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["marketId"], "0x1");
        assert_eq!(v["priceChange24h"], 8.52);
        assert_eq!(v["volume24h"], "1250000.00");
        assert_eq!(v["marketType"], "spot");
    }

    #[test]
    fn top3_share_field_name() {
        let c = VolumeConcentration {
            top_market_share: 1.0,
            top3_market_share: 2.0,
            top10_market_share: 3.0,
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["top3MarketShare"], 2.0);
        assert_eq!(v["top10MarketShare"], 3.0);
    }
}
