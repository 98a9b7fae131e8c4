//! Validate, fetch and compute: the path every command shares.

use std::future::Future;

use tracing::{info, instrument};

use crate::{
    error::{Result, StockError},
    indicators::{Bollinger, BollingerBands},
    models::{AnalystSummary, CompanyProfile, Period, PriceHistory},
    price_client::PriceClient,
};

/// What the commands need from a data provider.
pub trait MarketData: Send + Sync {
    fn validate(&self, symbol: &str) -> impl Future<Output = Result<bool>> + Send;

    fn history(&self, symbol: &str, period: Period)
    -> impl Future<Output = Result<PriceHistory>> + Send;

    fn current_price(&self, symbol: &str) -> impl Future<Output = Result<f64>> + Send;

    fn profile(&self, symbol: &str) -> impl Future<Output = Result<CompanyProfile>> + Send;

    fn analyst(&self, symbol: &str) -> impl Future<Output = Result<AnalystSummary>> + Send;
}

impl MarketData for PriceClient {
    async fn validate(&self, symbol: &str) -> Result<bool> {
        PriceClient::validate(self, symbol).await
    }

    async fn history(&self, symbol: &str, period: Period) -> Result<PriceHistory> {
        self.fetch_history(symbol, period).await
    }

    async fn current_price(&self, symbol: &str) -> Result<f64> {
        self.fetch_current_price(symbol).await
    }

    async fn profile(&self, symbol: &str) -> Result<CompanyProfile> {
        self.fetch_profile(symbol).await
    }

    async fn analyst(&self, symbol: &str) -> Result<AnalystSummary> {
        self.fetch_analyst(symbol).await
    }
}

/// Fail with `InvalidTicker` unless the provider knows `symbol`.
pub async fn ensure_valid<M: MarketData>(market: &M, symbol: &str) -> Result<()> {
    if market.validate(symbol).await? {
        Ok(())
    } else {
        info!(symbol, "rejected ticker");
        Err(StockError::InvalidTicker(symbol.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct PriceOverview {
    pub symbol: String,
    pub period: Period,
    pub history: PriceHistory,
    pub current_price: f64,
    pub market_cap: Option<u64>,
    pub currency: Option<String>,
}

#[instrument(skip(market))]
pub async fn price_overview<M: MarketData>(
    market: &M,
    symbol: &str,
    period: Period,
) -> Result<PriceOverview> {
    ensure_valid(market, symbol).await?;

    let history = market.history(symbol, period).await?;
    if history.points.is_empty() {
        return Err(StockError::provider(format!(
            "No data found for ticker '{symbol}'"
        )));
    }

    let current_price = market.current_price(symbol).await?;
    let profile = market.profile(symbol).await?;

    Ok(PriceOverview {
        symbol: symbol.to_string(),
        period,
        currency: profile.currency.or_else(|| history.currency.clone()),
        market_cap: profile.market_cap,
        history,
        current_price,
    })
}

#[instrument(skip(market))]
pub async fn company_overview<M: MarketData>(market: &M, symbol: &str) -> Result<CompanyProfile> {
    ensure_valid(market, symbol).await?;
    market.profile(symbol).await
}

#[derive(Debug, Clone)]
pub struct BollingerReport {
    pub symbol: String,
    pub history: PriceHistory,
    pub bands: Bollinger,
}

#[instrument(skip(market, bands))]
pub async fn bollinger_report<M: MarketData>(
    market: &M,
    symbol: &str,
    period: Period,
    bands: BollingerBands,
) -> Result<BollingerReport> {
    ensure_valid(market, symbol).await?;

    let history = market.history(symbol, period).await?;
    let bands = bands.compute(&history.points)?;

    Ok(BollingerReport {
        symbol: symbol.to_string(),
        history,
        bands,
    })
}

#[instrument(skip(market))]
pub async fn analyst_overview<M: MarketData>(market: &M, symbol: &str) -> Result<AnalystSummary> {
    ensure_valid(market, symbol).await?;
    market.analyst(symbol).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::models::PricePoint;

    #[derive(Default)]
    struct FakeMarket {
        valid: bool,
        len: usize,
        fetches: AtomicUsize,
    }

    impl FakeMarket {
        fn new(valid: bool, len: usize) -> Self {
            Self {
                valid,
                len,
                ..Default::default()
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl MarketData for FakeMarket {
        async fn validate(&self, _symbol: &str) -> Result<bool> {
            Ok(self.valid)
        }

        async fn history(&self, symbol: &str, _period: Period) -> Result<PriceHistory> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
            Ok(PriceHistory {
                symbol: symbol.to_string(),
                currency: Some("USD".into()),
                timezone: chrono_tz::America::New_York,
                regular_market_price: None,
                points: (0..self.len)
                    .map(|i| PricePoint {
                        timestamp: start + Duration::days(i as i64),
                        close: 100.0 + i as f64,
                    })
                    .collect(),
            })
        }

        async fn current_price(&self, _symbol: &str) -> Result<f64> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(123.456)
        }

        async fn profile(&self, symbol: &str) -> Result<CompanyProfile> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(CompanyProfile {
                symbol: symbol.to_string(),
                market_cap: Some(1_000_000),
                ..Default::default()
            })
        }

        async fn analyst(&self, symbol: &str) -> Result<AnalystSummary> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(AnalystSummary {
                symbol: symbol.to_string(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn invalid_ticker_stops_before_any_fetch() {
        let market = FakeMarket::new(false, 60);

        let err = bollinger_report(&market, "NOPE", Period::Month3, BollingerBands::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::InvalidTicker(s) if s == "NOPE"));

        assert!(price_overview(&market, "NOPE", Period::Month1).await.is_err());
        assert!(company_overview(&market, "NOPE").await.is_err());
        assert!(analyst_overview(&market, "NOPE").await.is_err());

        assert_eq!(market.fetches(), 0);
    }

    #[tokio::test]
    async fn bollinger_report_uses_fetched_history() {
        let market = FakeMarket::new(true, 60);
        let report = bollinger_report(&market, "AAPL", Period::Month3, BollingerBands::default())
            .await
            .unwrap();

        assert_eq!(report.bands.trailing.len(), 20);
        assert_eq!(report.bands.latest.price, 159.0);
        assert!((report.bands.latest.mean - 149.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn short_history_is_insufficient_data() {
        let market = FakeMarket::new(true, 15);
        let err = bollinger_report(&market, "NEW", Period::Month1, BollingerBands::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StockError::InsufficientData {
                required: 20,
                actual: 15
            }
        ));
    }

    #[tokio::test]
    async fn price_overview_collects_fields() {
        let market = FakeMarket::new(true, 5);
        let overview = price_overview(&market, "AAPL", Period::Month1).await.unwrap();

        assert_eq!(overview.current_price, 123.456);
        assert_eq!(overview.market_cap, Some(1_000_000));
        assert_eq!(overview.currency.as_deref(), Some("USD"));
        assert_eq!(overview.history.points.len(), 5);
    }

    #[tokio::test]
    async fn empty_history_is_a_provider_error() {
        let market = FakeMarket::new(true, 0);
        let err = price_overview(&market, "AAPL", Period::Month1).await.unwrap_err();
        assert!(matches!(err, StockError::Provider(_)));
    }
}
