// =============================================================================
// Injective Indexer REST Client
// =============================================================================
//
// Read-only client for the indexer's HTTP gateway. No signing, no retries:
// a failed call surfaces as a `SourceError` and the analytics layer decides
// whether it aborts the request or degrades a single market.
//
// Endpoints (relative to the configured base URL):
//   /api/exchange/{spot|derivative}/v1/markets
//   /api/exchange/{spot|derivative}/v1/markets/{market_id}
//   /api/exchange/{spot|derivative}/v2/orderbook/{market_id}
//   /api/exchange/{spot|derivative}/v1/trades?marketId=..&limit=..
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::injective::{
    BookLevel, MarketDataSource, MarketRecord, OrderbookSnapshot, SourceError, TradeRecord,
};
use crate::types::MarketKind;

/// Label used when the indexer omits a base or quote asset.
const UNKNOWN_ASSET: &str = "Unknown";

/// Injective indexer client over HTTP/JSON.
#[derive(Clone)]
pub struct IndexerClient {
    base_url: String,
    client: reqwest::Client,
}

impl IndexerClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new `IndexerClient`.
    ///
    /// # Arguments
    /// * `base_url`: indexer gateway root, e.g.
    ///   `https://sentry.exchange.grpc-web.injective.network`.
    /// * `timeout`: per-request transport timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("injective-market-intel/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(base_url = %base_url, "IndexerClient initialised");

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    /// GET `path` and parse the body as JSON. Non-2xx responses become
    /// `SourceError::Status` carrying the raw body.
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, SourceError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| SourceError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| SourceError::Decode {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })
    }

    // -------------------------------------------------------------------------
    // Shared per-kind fetchers
    // -------------------------------------------------------------------------

    async fn fetch_markets(&self, kind: MarketKind) -> Result<Vec<MarketRecord>, SourceError> {
        let path = format!("/api/exchange/{kind}/v1/markets");
        let body = self.get_json(&path, &[]).await?;
        let markets = decode_markets(&path, &body, kind)?;
        debug!(%kind, count = markets.len(), "markets fetched");
        Ok(markets)
    }

    async fn fetch_market(
        &self,
        kind: MarketKind,
        market_id: &str,
    ) -> Result<MarketRecord, SourceError> {
        let path = format!("/api/exchange/{kind}/v1/markets/{market_id}");
        let body = match self.get_json(&path, &[]).await {
            Err(SourceError::Status { status: 404, .. }) => {
                return Err(SourceError::NotFound {
                    kind,
                    market_id: market_id.to_string(),
                })
            }
            other => other?,
        };

        match body.get("market").filter(|m| m.is_object()) {
            Some(market) => Ok(decode_market(market, kind)),
            None => Err(SourceError::NotFound {
                kind,
                market_id: market_id.to_string(),
            }),
        }
    }

    async fn fetch_orderbook(
        &self,
        kind: MarketKind,
        market_id: &str,
    ) -> Result<OrderbookSnapshot, SourceError> {
        let path = format!("/api/exchange/{kind}/v2/orderbook/{market_id}");
        let body = self.get_json(&path, &[]).await?;
        let book = decode_orderbook(&path, &body)?;
        debug!(%kind, market_id, bids = book.bids.len(), asks = book.asks.len(), "orderbook fetched");
        Ok(book)
    }

    async fn fetch_trades(
        &self,
        kind: MarketKind,
        market_id: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, SourceError> {
        let path = format!("/api/exchange/{kind}/v1/trades");
        let query = [("marketId", market_id.to_string()), ("limit", limit.to_string())];
        let body = self.get_json(&path, &query).await?;
        let mut trades = decode_trades(&path, &body, kind)?;
        trades.truncate(limit);
        debug!(
            %kind,
            market_id,
            count = trades.len(),
            newest_at = trades.first().map_or(0, |t| t.executed_at),
            "trades fetched"
        );
        Ok(trades)
    }
}

#[async_trait]
impl MarketDataSource for IndexerClient {
    #[instrument(skip(self), name = "indexer::list_spot_markets")]
    async fn list_spot_markets(&self) -> Result<Vec<MarketRecord>, SourceError> {
        self.fetch_markets(MarketKind::Spot).await
    }

    #[instrument(skip(self), name = "indexer::list_derivative_markets")]
    async fn list_derivative_markets(&self) -> Result<Vec<MarketRecord>, SourceError> {
        self.fetch_markets(MarketKind::Derivative).await
    }

    #[instrument(skip(self), name = "indexer::get_spot_market")]
    async fn get_spot_market(&self, market_id: &str) -> Result<MarketRecord, SourceError> {
        self.fetch_market(MarketKind::Spot, market_id).await
    }

    #[instrument(skip(self), name = "indexer::get_derivative_market")]
    async fn get_derivative_market(&self, market_id: &str) -> Result<MarketRecord, SourceError> {
        self.fetch_market(MarketKind::Derivative, market_id).await
    }

    #[instrument(skip(self), name = "indexer::get_spot_orderbook")]
    async fn get_spot_orderbook(&self, market_id: &str) -> Result<OrderbookSnapshot, SourceError> {
        self.fetch_orderbook(MarketKind::Spot, market_id).await
    }

    #[instrument(skip(self), name = "indexer::get_derivative_orderbook")]
    async fn get_derivative_orderbook(
        &self,
        market_id: &str,
    ) -> Result<OrderbookSnapshot, SourceError> {
        self.fetch_orderbook(MarketKind::Derivative, market_id).await
    }

    #[instrument(skip(self), name = "indexer::get_spot_trades")]
    async fn get_spot_trades(
        &self,
        market_id: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, SourceError> {
        self.fetch_trades(MarketKind::Spot, market_id, limit).await
    }

    #[instrument(skip(self), name = "indexer::get_derivative_trades")]
    async fn get_derivative_trades(
        &self,
        market_id: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, SourceError> {
        self.fetch_trades(MarketKind::Derivative, market_id, limit).await
    }
}

impl std::fmt::Debug for IndexerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexerClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Payload decoding
// =============================================================================

/// Read a field that may be a string or a number as a decimal string.
fn decimal_field(v: &Value, name: &str) -> String {
    match v.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

/// First non-empty string among `candidates`, where each candidate is a path
/// of object keys.
fn first_label(v: &Value, candidates: &[&[&str]]) -> Option<String> {
    candidates.iter().find_map(|path| {
        let mut cur = v;
        for key in *path {
            cur = cur.get(*key)?;
        }
        cur.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Decode one market object.
///
/// Base label preference: `baseDenom`, `baseTokenMeta.symbol`, `oracleBase`.
/// Derivative markets carry no base denom, so they usually land on the
/// oracle symbol.
fn decode_market(v: &Value, kind: MarketKind) -> MarketRecord {
    MarketRecord {
        market_id: first_label(v, &[&["marketId"]]).unwrap_or_default(),
        ticker: first_label(v, &[&["ticker"]]).unwrap_or_default(),
        base_asset: first_label(
            v,
            &[&["baseDenom"], &["baseTokenMeta", "symbol"], &["oracleBase"]],
        )
        .unwrap_or_else(|| UNKNOWN_ASSET.to_string()),
        quote_asset: first_label(v, &[&["quoteDenom"], &["quoteTokenMeta", "symbol"]])
            .unwrap_or_else(|| UNKNOWN_ASSET.to_string()),
        kind,
    }
}

/// Decode a `{ "markets": [...] }` listing. Entries without a market id are
/// skipped.
fn decode_markets(
    endpoint: &str,
    body: &Value,
    kind: MarketKind,
) -> Result<Vec<MarketRecord>, SourceError> {
    let raw = body["markets"].as_array().ok_or_else(|| SourceError::Decode {
        endpoint: endpoint.to_string(),
        reason: "missing 'markets' array".to_string(),
    })?;

    let mut markets = Vec::with_capacity(raw.len());
    for entry in raw {
        let market = decode_market(entry, kind);
        if market.market_id.is_empty() {
            warn!(endpoint, "skipping market entry without marketId");
            continue;
        }
        markets.push(market);
    }
    Ok(markets)
}

fn decode_levels(raw: Option<&Value>) -> Vec<BookLevel> {
    raw.and_then(Value::as_array)
        .map(|levels| {
            levels
                .iter()
                .map(|l| BookLevel {
                    price: decimal_field(l, "price"),
                    quantity: decimal_field(l, "quantity"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Decode `{ "orderbook": { "buys": [...], "sells": [...] } }`.
///
/// An empty side is legal (thin markets); a missing `orderbook` object is not.
fn decode_orderbook(endpoint: &str, body: &Value) -> Result<OrderbookSnapshot, SourceError> {
    let book = body
        .get("orderbook")
        .filter(|b| b.is_object())
        .ok_or_else(|| SourceError::Decode {
            endpoint: endpoint.to_string(),
            reason: "missing 'orderbook' object".to_string(),
        })?;

    Ok(OrderbookSnapshot {
        bids: decode_levels(book.get("buys")),
        asks: decode_levels(book.get("sells")),
    })
}

/// Decode a `{ "trades": [...] }` listing.
///
/// Spot trades nest the fill under `price: { price, quantity }`; derivative
/// trades under `positionDelta: { executionPrice, executionQuantity }`.
fn decode_trades(
    endpoint: &str,
    body: &Value,
    kind: MarketKind,
) -> Result<Vec<TradeRecord>, SourceError> {
    let raw = body["trades"].as_array().ok_or_else(|| SourceError::Decode {
        endpoint: endpoint.to_string(),
        reason: "missing 'trades' array".to_string(),
    })?;

    let trades = raw
        .iter()
        .map(|t| {
            let executed_at = t["executedAt"].as_i64().unwrap_or(0);
            match kind {
                MarketKind::Spot => TradeRecord {
                    price: decimal_field(&t["price"], "price"),
                    quantity: decimal_field(&t["price"], "quantity"),
                    executed_at,
                },
                MarketKind::Derivative => TradeRecord {
                    price: decimal_field(&t["positionDelta"], "executionPrice"),
                    quantity: decimal_field(&t["positionDelta"], "executionQuantity"),
                    executed_at,
                },
            }
        })
        .collect();

    Ok(trades)
}
