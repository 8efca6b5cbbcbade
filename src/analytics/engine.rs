// =============================================================================
// Analytics Engine
// =============================================================================
//
// Turns raw indexer data into the derived views served by the API. Every
// operation is cache-fronted: a hit returns the stored `Arc` untouched, a miss
// fetches upstream, derives the view, stores it and returns it.
//
// Failure policy:
//   - A failing upstream call inside an all-or-nothing group aborts the
//     operation with `AnalyticsError::Upstream` and nothing is cached.
//   - Per-market failures inside a batch (summaries, alerts, opportunities)
//     degrade that one market and are logged at `warn`.
// =============================================================================

use std::sync::Arc;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::analytics::models::{
    render_price, render_quantity, render_total, CachedView, ConcentrationRisk,
    LiquidityOpportunity, MarketAnalytics, MarketOverview, MarketSummary, MomentumSignal,
    OrderbookDepth, PriceLevel, PriceStats, VolatilityAlert, VolumeConcentration, VolumeMetrics,
};
use crate::cache::{CacheStatus, TtlCache};
use crate::indicators::{
    concentration_ratio, format_compact, liquidity_score, momentum_score, momentum_signal,
    parse_safe_number, percentage_change, risk_level, round_to, total, volatility_index,
};
use crate::injective::{BookLevel, MarketDataSource, MarketRecord, SourceError, TradeRecord};
use crate::types::{ConcentrationLevel, MarketKind, VolumeTrend};

// ── Tunables ────────────────────────────────────────────────────────────────

/// Markets summarised per overview.
const OVERVIEW_MARKET_CAP: usize = 20;
/// Trades per market for an overview summary.
const SUMMARY_TRADE_LIMIT: usize = 50;
/// Trades per market for full analytics.
const ANALYTICS_TRADE_LIMIT: usize = 100;
/// Gainers and losers reported by the overview.
const TOP_MOVERS: usize = 5;
/// Markets considered by the signal scans, and levels per book side.
const SCAN_LIMIT: usize = 10;
const DEPTH_LEVELS: usize = 10;
/// Trades compared at each end of the window for the volume trend.
const TREND_WINDOW: usize = 10;
const DOMINANT_MARKETS: usize = 3;

// ── Cache keys ──────────────────────────────────────────────────────────────

const OVERVIEW_KEY: &str = "market_overview";
const MOMENTUM_KEY: &str = "momentum_signals";
const VOLATILITY_KEY: &str = "volatility_alerts";
const LIQUIDITY_KEY: &str = "liquidity_opportunities";
const CONCENTRATION_KEY: &str = "concentration_risk";

fn analytics_key(market_id: &str) -> String {
    format!("market_analytics_{market_id}")
}

fn depth_key(market_id: &str) -> String {
    format!("orderbook_depth_{market_id}")
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{operation} failed{}: {source}", for_market(.market_id))]
    Upstream {
        operation: &'static str,
        market_id: Option<String>,
        #[source]
        source: SourceError,
    },
}

fn for_market(market_id: &Option<String>) -> String {
    market_id
        .as_deref()
        .map(|id| format!(" for market {id}"))
        .unwrap_or_default()
}

impl AnalyticsError {
    fn upstream(operation: &'static str, market_id: Option<&str>, source: SourceError) -> Self {
        Self::Upstream {
            operation,
            market_id: market_id.map(str::to_string),
            source,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

pub struct AnalyticsEngine {
    source: Arc<dyn MarketDataSource>,
    cache: Arc<TtlCache<CachedView>>,
}

impl AnalyticsEngine {
    pub fn new(source: Arc<dyn MarketDataSource>, cache: Arc<TtlCache<CachedView>>) -> Self {
        Self { source, cache }
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    /// Drop every cached view. Returns how many entries were removed.
    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.clear();
        info!(removed, "cache cleared");
        removed
    }

    // -------------------------------------------------------------------------
    // Overview
    // -------------------------------------------------------------------------

    #[instrument(skip(self), name = "analytics::market_overview")]
    pub async fn market_overview(&self) -> Result<Arc<MarketOverview>, AnalyticsError> {
        if let Some(CachedView::Overview(hit)) = self.cache.get(OVERVIEW_KEY) {
            return Ok(hit);
        }

        let (total_markets, summaries) = self.market_summaries("market_overview").await?;

        let volumes: Vec<f64> = summaries
            .iter()
            .map(|s| parse_safe_number(&s.volume_24h))
            .collect();
        let total_volume = total(volumes.iter().copied());
        let market_health_score = health_score(&volumes);

        let mut ranked = summaries;
        ranked.sort_by(|a, b| b.price_change_24h.total_cmp(&a.price_change_24h));
        let top_gainers = ranked.iter().take(TOP_MOVERS).cloned().collect();
        let top_losers = ranked.iter().rev().take(TOP_MOVERS).cloned().collect();

        let overview = Arc::new(MarketOverview {
            total_markets,
            total_volume_24h: render_total(total_volume),
            top_gainers,
            top_losers,
            market_health_score,
        });

        info!(
            total_markets,
            summarised = ranked.len(),
            volume = %format_compact(total_volume),
            health = market_health_score,
            "market overview computed"
        );

        self.cache
            .set(OVERVIEW_KEY, CachedView::Overview(Arc::clone(&overview)));
        Ok(overview)
    }

    /// List every market, keep the first `OVERVIEW_MARKET_CAP` (spot first)
    /// and summarise each from its recent trades. Returns the full listing
    /// count alongside the summaries.
    async fn market_summaries(
        &self,
        operation: &'static str,
    ) -> Result<(usize, Vec<MarketSummary>), AnalyticsError> {
        let (spot, derivative) = tokio::try_join!(
            self.source.list_spot_markets(),
            self.source.list_derivative_markets(),
        )
        .map_err(|e| AnalyticsError::upstream(operation, None, e))?;

        let listed = spot.len() + derivative.len();
        let selected: Vec<MarketRecord> = spot
            .into_iter()
            .chain(derivative)
            .take(OVERVIEW_MARKET_CAP)
            .collect();

        let summaries = join_all(selected.iter().map(|market| async move {
            match self
                .source
                .get_trades(market.kind, &market.market_id, SUMMARY_TRADE_LIMIT)
                .await
            {
                Ok(trades) => summarize(market, &trades),
                Err(e) => {
                    warn!(
                        market_id = %market.market_id,
                        error = %e,
                        "trade fetch failed, reporting zero summary"
                    );
                    zero_summary(market)
                }
            }
        }))
        .await;

        Ok((listed, summaries))
    }

    // -------------------------------------------------------------------------
    // Per-market analytics
    // -------------------------------------------------------------------------

    #[instrument(skip(self), name = "analytics::market_analytics")]
    pub async fn market_analytics(
        &self,
        market_id: &str,
        kind: MarketKind,
    ) -> Result<Arc<MarketAnalytics>, AnalyticsError> {
        let key = analytics_key(market_id);
        if let Some(CachedView::Analytics(hit)) = self.cache.get(&key) {
            return Ok(hit);
        }

        let (market, trades, book) = tokio::try_join!(
            self.source.get_market(kind, market_id),
            self.source.get_trades(kind, market_id, ANALYTICS_TRADE_LIMIT),
            self.source.get_orderbook(kind, market_id),
        )
        .map_err(|e| AnalyticsError::upstream("market_analytics", Some(market_id), e))?;

        let prices = trade_prices(&trades);
        let quantities: Vec<f64> = trades.iter().map(|t| parse_safe_number(&t.quantity)).collect();

        let current = prices.first().copied().unwrap_or(0.0);
        let oldest = oldest_price(&prices, current);
        let (high, low) = price_range(&prices);

        let volume = total(quantities.iter().copied());
        let bid_depth = total(book.bids.iter().map(|l| parse_safe_number(&l.quantity)));
        let ask_depth = total(book.asks.iter().map(|l| parse_safe_number(&l.quantity)));

        let best_bid = best_price(&book.bids);
        let spread = if book.asks.is_empty() {
            0.0
        } else {
            best_price(&book.asks) - best_bid
        };

        let analytics = Arc::new(MarketAnalytics {
            market_id: market_id.to_string(),
            ticker: market.ticker,
            price_stats: PriceStats {
                current: render_price(current),
                high_24h: render_price(high),
                low_24h: render_price(low),
                change_24h: round_to(current - oldest, 6),
                change_percent_24h: round_to(percentage_change(oldest, current), 2),
            },
            volume_metrics: VolumeMetrics {
                volume_24h: render_total(volume),
                volume_trend: volume_trend(&quantities),
            },
            liquidity_score: liquidity_score(bid_depth, ask_depth, spread),
            volatility_index: round_to(volatility_index(&prices), 2),
        });

        debug!(
            market_id,
            trades = trades.len(),
            window_ms = trade_window_ms(&trades),
            volume = %format_compact(volume),
            "market analytics computed"
        );

        self.cache
            .set(key, CachedView::Analytics(Arc::clone(&analytics)));
        Ok(analytics)
    }

    // -------------------------------------------------------------------------
    // Orderbook depth
    // -------------------------------------------------------------------------

    #[instrument(skip(self), name = "analytics::orderbook_depth")]
    pub async fn orderbook_depth(
        &self,
        market_id: &str,
        kind: MarketKind,
    ) -> Result<Arc<OrderbookDepth>, AnalyticsError> {
        let key = depth_key(market_id);
        if let Some(CachedView::Depth(hit)) = self.cache.get(&key) {
            return Ok(hit);
        }

        let (market, book) = tokio::try_join!(
            self.source.get_market(kind, market_id),
            self.source.get_orderbook(kind, market_id),
        )
        .map_err(|e| AnalyticsError::upstream("orderbook_depth", Some(market_id), e))?;

        let best_bid = best_price(&book.bids);
        let best_ask = best_price(&book.asks);
        let spread = best_ask - best_bid;
        let spread_percent = if best_bid == 0.0 {
            0.0
        } else {
            spread / best_bid * 100.0
        };

        let bid_depth = render_levels(&book.bids);
        let ask_depth = render_levels(&book.asks);

        // Concentration uses the rendered totals, as served.
        let bid_totals: Vec<f64> = bid_depth.iter().map(|l| parse_safe_number(&l.total)).collect();
        let total_bid = total(bid_totals.iter().copied());
        let liquidity_concentration = if total_bid > 0.0 {
            bid_totals[0] / total_bid * 100.0
        } else {
            0.0
        };

        let depth = Arc::new(OrderbookDepth {
            market_id: market_id.to_string(),
            ticker: market.ticker,
            spread: render_price(spread),
            spread_percent: round_to(spread_percent, 4),
            bid_depth,
            ask_depth,
            liquidity_concentration: round_to(liquidity_concentration, 2),
        });

        self.cache.set(key, CachedView::Depth(Arc::clone(&depth)));
        Ok(depth)
    }

    // -------------------------------------------------------------------------
    // Signals
    // -------------------------------------------------------------------------

    #[instrument(skip(self), name = "analytics::momentum_signals")]
    pub async fn momentum_signals(&self) -> Result<Arc<Vec<MomentumSignal>>, AnalyticsError> {
        if let Some(CachedView::Momentum(hit)) = self.cache.get(MOMENTUM_KEY) {
            return Ok(hit);
        }

        let overview = self.market_overview().await?;

        let mut signals: Vec<MomentumSignal> = overview
            .top_gainers
            .iter()
            .chain(overview.top_losers.iter())
            .take(SCAN_LIMIT)
            .map(|m| {
                let score = momentum_score(m.price_change_24h, 0.0);
                MomentumSignal {
                    market_id: m.market_id.clone(),
                    ticker: m.ticker.clone(),
                    momentum_score: score,
                    price_change_24h: m.price_change_24h,
                    volume_change_24h: 0.0,
                    signal: momentum_signal(score),
                }
            })
            .collect();
        signals.sort_by(|a, b| b.momentum_score.total_cmp(&a.momentum_score));

        let signals = Arc::new(signals);
        self.cache
            .set(MOMENTUM_KEY, CachedView::Momentum(Arc::clone(&signals)));
        Ok(signals)
    }

    #[instrument(skip(self), name = "analytics::volatility_alerts")]
    pub async fn volatility_alerts(&self) -> Result<Arc<Vec<VolatilityAlert>>, AnalyticsError> {
        if let Some(CachedView::Volatility(hit)) = self.cache.get(VOLATILITY_KEY) {
            return Ok(hit);
        }

        let overview = self.market_overview().await?;
        let scan = scan_markets(&overview);

        let results = join_all(
            scan.iter()
                .map(|m| self.market_analytics(&m.market_id, m.market_type)),
        )
        .await;

        let mut alerts: Vec<VolatilityAlert> = scan
            .iter()
            .zip(results)
            .filter_map(|(m, res)| match res {
                Ok(a) => Some(VolatilityAlert {
                    market_id: a.market_id.clone(),
                    ticker: a.ticker.clone(),
                    volatility_index: a.volatility_index,
                    risk_level: risk_level(a.volatility_index),
                    price_deviation: a.price_stats.change_percent_24h,
                }),
                Err(e) => {
                    warn!(market_id = %m.market_id, error = %e, "skipping market in volatility scan");
                    None
                }
            })
            .collect();
        alerts.sort_by(|a, b| b.volatility_index.total_cmp(&a.volatility_index));

        let alerts = Arc::new(alerts);
        self.cache
            .set(VOLATILITY_KEY, CachedView::Volatility(Arc::clone(&alerts)));
        Ok(alerts)
    }

    #[instrument(skip(self), name = "analytics::liquidity_opportunities")]
    pub async fn liquidity_opportunities(
        &self,
    ) -> Result<Arc<Vec<LiquidityOpportunity>>, AnalyticsError> {
        if let Some(CachedView::Liquidity(hit)) = self.cache.get(LIQUIDITY_KEY) {
            return Ok(hit);
        }

        let overview = self.market_overview().await?;
        let scan = scan_markets(&overview);

        let results = join_all(scan.iter().map(|m| async move {
            tokio::try_join!(
                self.market_analytics(&m.market_id, m.market_type),
                self.orderbook_depth(&m.market_id, m.market_type),
            )
        }))
        .await;

        let mut opportunities: Vec<LiquidityOpportunity> = scan
            .iter()
            .zip(results)
            .filter_map(|(m, res)| match res {
                Ok((analytics, depth)) => Some(LiquidityOpportunity {
                    market_id: analytics.market_id.clone(),
                    ticker: analytics.ticker.clone(),
                    liquidity_score: analytics.liquidity_score,
                    spread: depth.spread.clone(),
                    spread_percent: depth.spread_percent,
                    estimated_slippage: round_to(depth.spread_percent / 2.0, 4),
                }),
                Err(e) => {
                    warn!(market_id = %m.market_id, error = %e, "skipping market in liquidity scan");
                    None
                }
            })
            .collect();
        opportunities.sort_by(|a, b| b.liquidity_score.total_cmp(&a.liquidity_score));

        let opportunities = Arc::new(opportunities);
        self.cache
            .set(LIQUIDITY_KEY, CachedView::Liquidity(Arc::clone(&opportunities)));
        Ok(opportunities)
    }

    // -------------------------------------------------------------------------
    // Concentration risk
    // -------------------------------------------------------------------------

    #[instrument(skip(self), name = "analytics::concentration_risk")]
    pub async fn concentration_risk(&self) -> Result<Arc<ConcentrationRisk>, AnalyticsError> {
        if let Some(CachedView::Concentration(hit)) = self.cache.get(CONCENTRATION_KEY) {
            return Ok(hit);
        }

        let (_, summaries) = self.market_summaries("concentration_risk").await?;

        let mut by_volume: Vec<(f64, MarketSummary)> = summaries
            .into_iter()
            .map(|s| (parse_safe_number(&s.volume_24h), s))
            .collect();
        by_volume.sort_by(|a, b| b.0.total_cmp(&a.0));

        let shares: Vec<f64> = by_volume.iter().map(|(v, _)| *v).collect();
        let volume_total = total(shares.iter().copied());
        let share_of_top = |n: usize| {
            if volume_total > 0.0 {
                round_to(total(shares.iter().take(n).copied()) / volume_total * 100.0, 2)
            } else {
                0.0
            }
        };

        let ratio = round_to(concentration_ratio(&shares), 2);
        let risk_level = if ratio > 75.0 {
            ConcentrationLevel::High
        } else if ratio > 50.0 {
            ConcentrationLevel::Medium
        } else {
            ConcentrationLevel::Low
        };

        let risk = Arc::new(ConcentrationRisk {
            volume_concentration: VolumeConcentration {
                top_market_share: share_of_top(1),
                top3_market_share: share_of_top(3),
                top10_market_share: share_of_top(10),
            },
            concentration_ratio: ratio,
            risk_level,
            dominant_markets: by_volume
                .into_iter()
                .take(DOMINANT_MARKETS)
                .map(|(_, s)| s)
                .collect(),
        });

        info!(ratio, level = ?risk.risk_level, volume = %format_compact(volume_total), "concentration computed");

        self.cache
            .set(CONCENTRATION_KEY, CachedView::Concentration(Arc::clone(&risk)));
        Ok(risk)
    }
}

impl std::fmt::Debug for AnalyticsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsEngine")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Derivation helpers
// =============================================================================

fn trade_prices(trades: &[TradeRecord]) -> Vec<f64> {
    trades.iter().map(|t| parse_safe_number(&t.price)).collect()
}

/// Oldest price in a newest-first window; falls back to `current` when the
/// window is empty or the oldest print is zero.
fn oldest_price(prices: &[f64], current: f64) -> f64 {
    prices
        .last()
        .copied()
        .filter(|p| *p != 0.0)
        .unwrap_or(current)
}

/// (high, low) of the window, (0, 0) when empty.
fn price_range(prices: &[f64]) -> (f64, f64) {
    if prices.is_empty() {
        return (0.0, 0.0);
    }
    let high = prices.iter().copied().fold(f64::MIN, f64::max);
    let low = prices.iter().copied().fold(f64::MAX, f64::min);
    (high, low)
}

/// Time covered by a newest-first trade window, 0 when a timestamp is unknown.
fn trade_window_ms(trades: &[TradeRecord]) -> i64 {
    match (trades.first(), trades.last()) {
        (Some(newest), Some(oldest)) if newest.executed_at > 0 && oldest.executed_at > 0 => {
            (newest.executed_at - oldest.executed_at).max(0)
        }
        _ => 0,
    }
}

fn best_price(levels: &[BookLevel]) -> f64 {
    levels
        .first()
        .map(|l| parse_safe_number(&l.price))
        .unwrap_or(0.0)
}

/// Compare the newest `TREND_WINDOW` quantities against the oldest ones.
fn volume_trend(quantities: &[f64]) -> VolumeTrend {
    let recent = total(quantities.iter().take(TREND_WINDOW).copied());
    let older = total(
        quantities[quantities.len().saturating_sub(TREND_WINDOW)..]
            .iter()
            .copied(),
    );

    if recent > older * 1.1 {
        VolumeTrend::Increasing
    } else if recent < older * 0.9 {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Stable
    }
}

fn render_levels(levels: &[BookLevel]) -> Vec<PriceLevel> {
    levels
        .iter()
        .take(DEPTH_LEVELS)
        .map(|l| {
            let price = parse_safe_number(&l.price);
            let quantity = parse_safe_number(&l.quantity);
            PriceLevel {
                price: render_price(price),
                quantity: render_quantity(quantity),
                total: render_total(price * quantity),
            }
        })
        .collect()
}

fn summarize(market: &MarketRecord, trades: &[TradeRecord]) -> MarketSummary {
    let prices = trade_prices(trades);
    let current = prices.first().copied().unwrap_or(0.0);
    let oldest = oldest_price(&prices, current);
    let volume = total(trades.iter().map(|t| parse_safe_number(&t.quantity)));

    MarketSummary {
        market_id: market.market_id.clone(),
        ticker: market.ticker.clone(),
        base_asset: market.base_asset.clone(),
        quote_asset: market.quote_asset.clone(),
        current_price: render_price(current),
        price_change_24h: round_to(percentage_change(oldest, current), 2),
        volume_24h: render_total(volume),
        market_type: market.kind,
    }
}

fn zero_summary(market: &MarketRecord) -> MarketSummary {
    MarketSummary {
        market_id: market.market_id.clone(),
        ticker: market.ticker.clone(),
        base_asset: market.base_asset.clone(),
        quote_asset: market.quote_asset.clone(),
        current_price: "0".to_string(),
        price_change_24h: 0.0,
        volume_24h: "0".to_string(),
        market_type: market.kind,
    }
}

/// Share of summaries with positive volume, as a 0–100 integer.
fn health_score(volumes: &[f64]) -> u32 {
    if volumes.is_empty() {
        return 0;
    }
    let active = volumes.iter().filter(|v| **v > 0.0).count();
    (active as f64 / volumes.len() as f64 * 100.0)
        .min(100.0)
        .round() as u32
}

/// Gainers then losers, first occurrence of each market kept, capped.
fn scan_markets(overview: &MarketOverview) -> Vec<MarketSummary> {
    let mut seen = std::collections::HashSet::new();
    overview
        .top_gainers
        .iter()
        .chain(overview.top_losers.iter())
        .filter(|m| seen.insert(m.market_id.clone()))
        .take(SCAN_LIMIT)
        .cloned()
        .collect()
}
