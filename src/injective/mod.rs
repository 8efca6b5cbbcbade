// =============================================================================
// Injective Market Data Source
// =============================================================================
//
// The capability the analytics engine consumes: list markets, look one up,
// and fetch its orderbook and most recent trades. `IndexerClient` is the
// production implementation over the indexer's REST gateway; tests use the
// in-memory `FakeSource`.
//
// Raw numeric fields stay as the decimal strings the indexer returns. The
// analytics layer decides how to coerce them.
// =============================================================================

pub mod client;
#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::MarketKind;

pub use client::IndexerClient;

// =============================================================================
// Records
// =============================================================================

/// A tradeable pair as listed by the indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRecord {
    pub market_id: String,
    pub ticker: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub kind: MarketKind,
}

/// One executed trade. Sources return these newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub price: String,
    pub quantity: String,
    /// Execution time, ms since the UNIX epoch (0 when unknown).
    #[serde(default)]
    pub executed_at: i64,
}

/// One resting price level as returned by the indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: String,
    pub quantity: String,
}

/// Bids sorted best (highest) first, asks sorted best (lowest) first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{kind} market {market_id} not found")]
    NotFound { kind: MarketKind, market_id: String },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("unexpected payload from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

// =============================================================================
// Capability
// =============================================================================

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn list_spot_markets(&self) -> Result<Vec<MarketRecord>, SourceError>;
    async fn list_derivative_markets(&self) -> Result<Vec<MarketRecord>, SourceError>;

    async fn get_spot_market(&self, market_id: &str) -> Result<MarketRecord, SourceError>;
    async fn get_derivative_market(&self, market_id: &str) -> Result<MarketRecord, SourceError>;

    async fn get_spot_orderbook(&self, market_id: &str) -> Result<OrderbookSnapshot, SourceError>;
    async fn get_derivative_orderbook(
        &self,
        market_id: &str,
    ) -> Result<OrderbookSnapshot, SourceError>;

    /// At most `limit` trades, newest first.
    async fn get_spot_trades(
        &self,
        market_id: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, SourceError>;
    async fn get_derivative_trades(
        &self,
        market_id: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, SourceError>;

    // ── Kind-dispatching helpers ────────────────────────────────────────

    async fn get_market(
        &self,
        kind: MarketKind,
        market_id: &str,
    ) -> Result<MarketRecord, SourceError> {
        match kind {
            MarketKind::Spot => self.get_spot_market(market_id).await,
            MarketKind::Derivative => self.get_derivative_market(market_id).await,
        }
    }

    async fn get_orderbook(
        &self,
        kind: MarketKind,
        market_id: &str,
    ) -> Result<OrderbookSnapshot, SourceError> {
        match kind {
            MarketKind::Spot => self.get_spot_orderbook(market_id).await,
            MarketKind::Derivative => self.get_derivative_orderbook(market_id).await,
        }
    }

    async fn get_trades(
        &self,
        kind: MarketKind,
        market_id: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, SourceError> {
        match kind {
            MarketKind::Spot => self.get_spot_trades(market_id, limit).await,
            MarketKind::Derivative => self.get_derivative_trades(market_id, limit).await,
        }
    }
}
