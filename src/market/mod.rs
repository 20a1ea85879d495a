//! Live market data for the token: an ordered chain of provider
//! strategies tried in sequence until one succeeds, ending in a
//! deterministic demo generator so interactive deployments always have
//! something to show.
//!
//! The core never caches snapshots; each chat turn may request a fresh
//! one, and a failed fetch degrades the response instead of failing it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AssistantConfig;
use crate::error::AssistantError;

/// CoinMarketCap id pinned to the CGPT listing.
const CMC_TOKEN_ID: u64 = 38439;

/// CoinGecko asset id for the token.
const COINGECKO_ASSET_ID: &str = "crypgpt";

/// Where a snapshot came from. `Demo` marks synthetic data so callers can
/// distinguish it from live feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    Coinmarketcap,
    Coingecko,
    Demo,
}

/// Point-in-time market reading for the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub price: f64,
    pub market_cap: f64,
    pub volume24h: f64,
    pub source: SnapshotSource,
    pub last_updated: DateTime<Utc>,
}

/// The reduced projection echoed to clients on chat responses. The
/// internal `source` tag stays server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    pub price: f64,
    pub market_cap: f64,
    pub volume24h: f64,
    pub last_updated: DateTime<Utc>,
}

impl From<&TokenSnapshot> for SnapshotView {
    fn from(snapshot: &TokenSnapshot) -> Self {
        Self {
            price: snapshot.price,
            market_cap: snapshot.market_cap,
            volume24h: snapshot.volume24h,
            last_updated: snapshot.last_updated,
        }
    }
}

/// One market-data provider strategy.
#[async_trait]
pub trait TokenDataProvider: Send + Sync {
    /// Provider name used in fall-through logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<TokenSnapshot, AssistantError>;
}

// ---------------------------------------------------------------------------
// CoinMarketCap
// ---------------------------------------------------------------------------

/// CoinMarketCap `quotes/latest` provider.
pub struct CoinMarketCapProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl CoinMarketCapProvider {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            base_url,
            api_key,
            client,
        }
    }
}

#[async_trait]
impl TokenDataProvider for CoinMarketCapProvider {
    fn name(&self) -> &'static str {
        "coinmarketcap"
    }

    async fn fetch(&self) -> Result<TokenSnapshot, AssistantError> {
        let url = format!(
            "{}/cryptocurrency/quotes/latest?id={}&convert=USD",
            self.base_url, CMC_TOKEN_ID
        );

        let response = self
            .client
            .get(&url)
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AssistantError::upstream(format!("CoinMarketCap request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::upstream(format!(
                "CoinMarketCap API error {}: {}",
                status, body
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AssistantError::upstream(format!("CoinMarketCap response: {}", e)))?;

        let token = data
            .get("data")
            .and_then(|d| d.get(CMC_TOKEN_ID.to_string()))
            .ok_or_else(|| {
                AssistantError::upstream("token data not found in CoinMarketCap response")
            })?;

        let quote = token
            .get("quote")
            .and_then(|q| q.get("USD"))
            .ok_or_else(|| {
                AssistantError::upstream("USD quote not found in CoinMarketCap response")
            })?;

        let price = quote.get("price").and_then(Value::as_f64).unwrap_or(0.0);

        // Match the CMC portal display logic: prefer the self-reported
        // market cap, else derive it from the self-reported circulating
        // supply.
        let market_cap = quote
            .get("self_reported_market_cap")
            .and_then(Value::as_f64)
            .or_else(|| {
                token
                    .get("self_reported_circulating_supply")
                    .and_then(Value::as_f64)
                    .map(|supply| price * supply)
            })
            .unwrap_or(0.0);

        Ok(TokenSnapshot {
            price,
            market_cap,
            volume24h: quote
                .get("volume_24h")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            source: SnapshotSource::Coinmarketcap,
            last_updated: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// CoinGecko
// ---------------------------------------------------------------------------

/// CoinGecko `simple/price` provider (keyless fallback).
pub struct CoinGeckoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url("https://api.coingecko.com".to_string(), timeout)
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { base_url, client }
    }
}

#[async_trait]
impl TokenDataProvider for CoinGeckoProvider {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn fetch(&self) -> Result<TokenSnapshot, AssistantError> {
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies=usd&include_market_cap=true&include_24hr_vol=true",
            self.base_url, COINGECKO_ASSET_ID
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AssistantError::upstream(format!("CoinGecko request: {}", e)))?;

        if !response.status().is_success() {
            return Err(AssistantError::upstream(format!(
                "CoinGecko API error {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AssistantError::upstream(format!("CoinGecko response: {}", e)))?;

        let asset = data.get(COINGECKO_ASSET_ID).ok_or_else(|| {
            AssistantError::upstream("asset not found in CoinGecko response")
        })?;

        let price = asset
            .get("usd")
            .and_then(Value::as_f64)
            .ok_or_else(|| AssistantError::upstream("USD price missing in CoinGecko response"))?;

        Ok(TokenSnapshot {
            price,
            market_cap: asset
                .get("usd_market_cap")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            volume24h: asset
                .get("usd_24h_vol")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            source: SnapshotSource::Coingecko,
            last_updated: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Demo data
// ---------------------------------------------------------------------------

/// Terminal provider producing deterministic synthetic data.
///
/// Seeded with a fixed constant rather than the clock, so demo values are
/// stable across calls and clearly not market noise. The `demo` source
/// tag lets callers tell them apart from live feeds.
pub struct DemoDataProvider;

/// Fixed LCG seed for demo data.
const DEMO_SEED: u64 = 0x5DEECE66D;

struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn next_in(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_unit() * (high - low)
    }
}

#[async_trait]
impl TokenDataProvider for DemoDataProvider {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn fetch(&self) -> Result<TokenSnapshot, AssistantError> {
        let mut rng = Lcg(DEMO_SEED);

        Ok(TokenSnapshot {
            price: rng.next_in(0.002, 0.01),
            market_cap: rng.next_in(1_000_000.0, 10_000_000.0).round(),
            volume24h: rng.next_in(50_000.0, 500_000.0).round(),
            source: SnapshotSource::Demo,
            last_updated: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Provider chain
// ---------------------------------------------------------------------------

/// Ordered provider chain: each strategy is tried in sequence until one
/// succeeds.
pub struct MarketDataService {
    providers: Vec<Arc<dyn TokenDataProvider>>,
}

impl MarketDataService {
    pub fn new(providers: Vec<Arc<dyn TokenDataProvider>>) -> Self {
        Self { providers }
    }

    /// Standard chain from configuration: CoinMarketCap (when configured),
    /// CoinGecko, demo data.
    pub fn from_config(config: &AssistantConfig) -> Self {
        let mut providers: Vec<Arc<dyn TokenDataProvider>> = Vec::new();

        if let (Some(base_url), Some(api_key)) = (&config.cmc_base_url, &config.cmc_api_key) {
            providers.push(Arc::new(CoinMarketCapProvider::new(
                base_url.clone(),
                api_key.clone(),
                config.request_timeout,
            )));
        } else {
            tracing::warn!("CoinMarketCap credentials not set; provider skipped");
        }

        providers.push(Arc::new(CoinGeckoProvider::new(config.request_timeout)));
        providers.push(Arc::new(DemoDataProvider));

        Self::new(providers)
    }

    /// Fetch a snapshot from the first provider that succeeds.
    pub async fn fetch_token_snapshot(&self) -> Result<TokenSnapshot, AssistantError> {
        for provider in &self.providers {
            match provider.fetch().await {
                Ok(snapshot) => {
                    tracing::debug!(provider = provider.name(), "token snapshot fetched");
                    return Ok(snapshot);
                }
                Err(err) => {
                    tracing::warn!(provider = provider.name(), %err, "provider failed; trying next");
                }
            }
        }

        Err(AssistantError::upstream(
            "all market-data providers failed",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider {
        name: &'static str,
        result: Result<f64, ()>,
    }

    #[async_trait]
    impl TokenDataProvider for FixedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self) -> Result<TokenSnapshot, AssistantError> {
            match self.result {
                Ok(price) => Ok(TokenSnapshot {
                    price,
                    market_cap: 1.0,
                    volume24h: 1.0,
                    source: SnapshotSource::Coingecko,
                    last_updated: Utc::now(),
                }),
                Err(()) => Err(AssistantError::upstream("down")),
            }
        }
    }

    #[tokio::test]
    async fn test_chain_first_success_wins() {
        let service = MarketDataService::new(vec![
            Arc::new(FixedProvider {
                name: "a",
                result: Ok(1.0),
            }),
            Arc::new(FixedProvider {
                name: "b",
                result: Ok(2.0),
            }),
        ]);

        let snapshot = service.fetch_token_snapshot().await.unwrap();
        assert_eq!(snapshot.price, 1.0);
    }

    #[tokio::test]
    async fn test_chain_falls_through_on_failure() {
        let service = MarketDataService::new(vec![
            Arc::new(FixedProvider {
                name: "a",
                result: Err(()),
            }),
            Arc::new(FixedProvider {
                name: "b",
                result: Ok(2.0),
            }),
        ]);

        let snapshot = service.fetch_token_snapshot().await.unwrap();
        assert_eq!(snapshot.price, 2.0);
    }

    #[tokio::test]
    async fn test_chain_exhaustion_is_an_error() {
        let service = MarketDataService::new(vec![Arc::new(FixedProvider {
            name: "a",
            result: Err(()),
        })]);

        assert!(service.fetch_token_snapshot().await.is_err());
    }

    #[tokio::test]
    async fn test_demo_provider_is_deterministic_and_tagged() {
        let first = DemoDataProvider.fetch().await.unwrap();
        let second = DemoDataProvider.fetch().await.unwrap();

        assert_eq!(first.source, SnapshotSource::Demo);
        assert_eq!(first.price, second.price);
        assert_eq!(first.market_cap, second.market_cap);
        assert!(first.price >= 0.002 && first.price <= 0.01);
        assert!(first.market_cap >= 1_000_000.0 && first.market_cap <= 10_000_000.0);
        assert!(first.volume24h >= 50_000.0 && first.volume24h <= 500_000.0);
    }

    #[test]
    fn test_snapshot_view_drops_source() {
        let snapshot = TokenSnapshot {
            price: 0.0042,
            market_cap: 2_000_000.0,
            volume24h: 120_000.0,
            source: SnapshotSource::Demo,
            last_updated: Utc::now(),
        };

        let view = SnapshotView::from(&snapshot);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("source").is_none());
        assert_eq!(json["price"], 0.0042);
        assert!(json.get("marketCap").is_some());
    }
}
