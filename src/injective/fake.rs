// =============================================================================
// In-memory MarketDataSource for tests
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::injective::{
    BookLevel, MarketDataSource, MarketRecord, OrderbookSnapshot, SourceError, TradeRecord,
};
use crate::types::MarketKind;

/// Canned markets, trades and books, with per-call counters and injectable
/// failures.
#[derive(Default)]
pub struct FakeSource {
    markets: RwLock<Vec<MarketRecord>>,
    trades: RwLock<HashMap<String, Vec<TradeRecord>>>,
    books: RwLock<HashMap<String, OrderbookSnapshot>>,
    failing_trades: RwLock<HashSet<String>>,
    failing_books: RwLock<HashSet<String>>,
    fail_listing: RwLock<bool>,

    pub list_calls: AtomicUsize,
    pub market_calls: AtomicUsize,
    pub trade_calls: AtomicUsize,
    pub book_calls: AtomicUsize,
}

pub fn market(id: &str, ticker: &str, kind: MarketKind) -> MarketRecord {
    let (base, quote) = ticker.split_once('/').unwrap_or((ticker, "USDT"));
    MarketRecord {
        market_id: id.to_string(),
        ticker: ticker.to_string(),
        base_asset: base.to_string(),
        quote_asset: quote.to_string(),
        kind,
    }
}

/// Build newest-first trades from `(price, quantity)` pairs.
pub fn trades(fills: &[(f64, f64)]) -> Vec<TradeRecord> {
    fills
        .iter()
        .enumerate()
        .map(|(i, (p, q))| TradeRecord {
            price: p.to_string(),
            quantity: q.to_string(),
            executed_at: 1_700_000_000_000 - i as i64 * 1_000,
        })
        .collect()
}

pub fn book(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> OrderbookSnapshot {
    let level = |(p, q): &(f64, f64)| BookLevel {
        price: p.to_string(),
        quantity: q.to_string(),
    };
    OrderbookSnapshot {
        bids: bids.iter().map(level).collect(),
        asks: asks.iter().map(level).collect(),
    }
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_market(self, record: MarketRecord) -> Self {
        self.markets.write().push(record);
        self
    }

    pub fn with_trades(self, market_id: &str, fills: &[(f64, f64)]) -> Self {
        self.trades
            .write()
            .insert(market_id.to_string(), trades(fills));
        self
    }

    pub fn with_book(self, market_id: &str, bids: &[(f64, f64)], asks: &[(f64, f64)]) -> Self {
        self.books
            .write()
            .insert(market_id.to_string(), book(bids, asks));
        self
    }

    pub fn failing_trades_for(self, market_id: &str) -> Self {
        self.failing_trades.write().insert(market_id.to_string());
        self
    }

    pub fn failing_book_for(self, market_id: &str) -> Self {
        self.failing_books.write().insert(market_id.to_string());
        self
    }

    pub fn failing_listing(self) -> Self {
        *self.fail_listing.write() = true;
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn upstream_error(endpoint: &str) -> SourceError {
        SourceError::Status {
            endpoint: endpoint.to_string(),
            status: 503,
            body: "upstream unavailable".to_string(),
        }
    }

    fn list(&self, kind: MarketKind) -> Result<Vec<MarketRecord>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_listing.read() {
            return Err(Self::upstream_error("markets"));
        }
        Ok(self
            .markets
            .read()
            .iter()
            .filter(|m| m.kind == kind)
            .cloned()
            .collect())
    }

    fn lookup(&self, kind: MarketKind, market_id: &str) -> Result<MarketRecord, SourceError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        self.markets
            .read()
            .iter()
            .find(|m| m.kind == kind && m.market_id == market_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                kind,
                market_id: market_id.to_string(),
            })
    }

    fn recent_trades(&self, market_id: &str, limit: usize) -> Result<Vec<TradeRecord>, SourceError> {
        self.trade_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_trades.read().contains(market_id) {
            return Err(Self::upstream_error("trades"));
        }
        let mut t = self.trades.read().get(market_id).cloned().unwrap_or_default();
        t.truncate(limit);
        Ok(t)
    }

    fn orderbook(&self, market_id: &str) -> Result<OrderbookSnapshot, SourceError> {
        self.book_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_books.read().contains(market_id) {
            return Err(Self::upstream_error("orderbook"));
        }
        Ok(self.books.read().get(market_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn list_spot_markets(&self) -> Result<Vec<MarketRecord>, SourceError> {
        self.list(MarketKind::Spot)
    }

    async fn list_derivative_markets(&self) -> Result<Vec<MarketRecord>, SourceError> {
        self.list(MarketKind::Derivative)
    }

    async fn get_spot_market(&self, market_id: &str) -> Result<MarketRecord, SourceError> {
        self.lookup(MarketKind::Spot, market_id)
    }

    async fn get_derivative_market(&self, market_id: &str) -> Result<MarketRecord, SourceError> {
        self.lookup(MarketKind::Derivative, market_id)
    }

    async fn get_spot_orderbook(&self, market_id: &str) -> Result<OrderbookSnapshot, SourceError> {
        self.orderbook(market_id)
    }

    async fn get_derivative_orderbook(
        &self,
        market_id: &str,
    ) -> Result<OrderbookSnapshot, SourceError> {
        self.orderbook(market_id)
    }

    async fn get_spot_trades(
        &self,
        market_id: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, SourceError> {
        self.recent_trades(market_id, limit)
    }

    async fn get_derivative_trades(
        &self,
        market_id: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, SourceError> {
        self.recent_trades(market_id, limit)
    }
}
