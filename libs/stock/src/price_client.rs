use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    error::{Result, StockError},
    exchange::normalize,
    models::{
        AnalystSummary, CompanyProfile, Period, PriceHistory, PricePoint, RecommendationTrend,
    },
    session::Session,
};

/// Yahoo Finance client. Every request goes through the shared [`Session`].
#[derive(Clone)]
pub struct PriceClient {
    session: Arc<Session>,
}

impl PriceClient {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn from_env() -> Result<Self> {
        Ok(Self::new(Arc::new(Session::from_env().await?)))
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Daily closes over `period`.
    #[instrument(skip(self))]
    pub async fn fetch_history(&self, symbol: &str, period: Period) -> Result<PriceHistory> {
        let url = self
            .session
            .url(&format!("v8/finance/chart/{}", normalize(symbol)));

        let res: ChartResponse = self
            .session
            .get_json(
                &url,
                &[
                    ("range", period.as_str()),
                    ("interval", "1d"),
                    ("includePrePost", "false"),
                ],
            )
            .await?;

        let history = res.into_history()?;
        debug!(points = history.points.len(), "fetched history");
        Ok(history)
    }

    /// Close of the latest daily bar.
    pub async fn fetch_current_price(&self, symbol: &str) -> Result<f64> {
        let history = self.fetch_history(symbol, Period::Day1).await?;
        history
            .last_close()
            .or(history.regular_market_price)
            .ok_or_else(|| StockError::provider(format!("No data found for ticker '{symbol}'")))
    }

    #[instrument(skip(self, modules))]
    async fn fetch_summary(&self, symbol: &str, modules: &[&str]) -> Result<SummaryResult> {
        let url = self
            .session
            .url(&format!("v10/finance/quoteSummary/{}", normalize(symbol)));

        let modules = modules.join(",");
        let res: SummaryResponse = self
            .session
            .get_json_authed(&url, &[("modules", modules.as_str())])
            .await?;

        res.into_result()
    }

    /// True when the provider knows `symbol` under exactly that name.
    #[instrument(skip(self))]
    pub async fn validate(&self, symbol: &str) -> Result<bool> {
        match self.fetch_summary(symbol, &["price"]).await {
            Ok(summary) => Ok(summary.matches_symbol(symbol)),
            Err(e) if e.is_not_found() => {
                debug!("provider does not know symbol");
                Ok(false)
            }
            Err(StockError::Provider(msg)) if msg.contains("Not Found") => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let summary = self.fetch_summary(symbol, &["price", "assetProfile"]).await?;
        Ok(summary.into_profile(symbol))
    }

    pub async fn fetch_analyst(&self, symbol: &str) -> Result<AnalystSummary> {
        let summary = self
            .fetch_summary(
                symbol,
                &["price", "financialData", "recommendationTrend"],
            )
            .await?;
        Ok(summary.into_analyst(symbol))
    }
}

//
// Yahoo chart endpoint
// GET /v8/finance/chart/{symbol}
//
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ProviderFault>,
}

#[derive(Debug, Deserialize)]
struct ProviderFault {
    code: Option<String>,
    description: Option<String>,
}

impl ProviderFault {
    fn into_error(self) -> StockError {
        StockError::provider(format!(
            "{}: {}",
            self.code.unwrap_or_else(|| "error".into()),
            self.description.unwrap_or_default()
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    currency: Option<String>,
    exchange_timezone_name: Option<String>,
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResponse {
    pub fn into_history(self) -> Result<PriceHistory> {
        if let Some(fault) = self.chart.error {
            return Err(fault.into_error());
        }

        let result = self
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| StockError::provider("chart response has no result"))?;

        let timezone = result
            .meta
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| match name.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(_) => {
                    warn!(timezone = name, "unknown exchange timezone, using UTC");
                    None
                }
            })
            .unwrap_or(Tz::UTC);

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let mut points: Vec<PricePoint> = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let close = close.filter(|c| c.is_finite())?;
                let timestamp = DateTime::<Utc>::from_timestamp(*ts, 0)?;
                Some(PricePoint { timestamp, close })
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);

        Ok(PriceHistory {
            symbol: result.meta.symbol,
            currency: result.meta.currency,
            timezone,
            regular_market_price: result.meta.regular_market_price,
            points,
        })
    }
}

//
// Yahoo quote summary endpoint
// GET /v10/finance/quoteSummary/{symbol}?modules=...
//
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    quote_summary: SummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    result: Option<Vec<SummaryResult>>,
    error: Option<ProviderFault>,
}

impl SummaryResponse {
    fn into_result(self) -> Result<SummaryResult> {
        if let Some(fault) = self.quote_summary.error {
            return Err(fault.into_error());
        }

        self.quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| StockError::provider("quote summary has no result"))
    }
}

/// Yahoo wraps numbers as `{ "raw": 1.0, "fmt": "1.00" }`, or `{}` when absent.
#[derive(Debug, Default, Deserialize)]
struct Raw {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: &Option<Raw>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    price: Option<PriceModule>,
    asset_profile: Option<AssetProfile>,
    financial_data: Option<FinancialData>,
    recommendation_trend: Option<TrendModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    symbol: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    currency: Option<String>,
    market_cap: Option<Raw>,
    regular_market_price: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
    website: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    current_price: Option<Raw>,
    target_high_price: Option<Raw>,
    target_low_price: Option<Raw>,
    target_mean_price: Option<Raw>,
    recommendation_mean: Option<Raw>,
    recommendation_key: Option<String>,
    number_of_analyst_opinions: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
struct TrendModule {
    #[serde(default)]
    trend: Vec<TrendRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrendRow {
    period: String,
    strong_buy: u32,
    buy: u32,
    hold: u32,
    sell: u32,
    strong_sell: u32,
}

impl SummaryResult {
    fn matches_symbol(&self, symbol: &str) -> bool {
        self.price
            .as_ref()
            .and_then(|p| p.symbol.as_deref())
            .is_some_and(|s| s == normalize(symbol))
    }

    fn into_profile(self, symbol: &str) -> CompanyProfile {
        let price = self.price.unwrap_or_default();
        let profile = self.asset_profile.unwrap_or_default();

        CompanyProfile {
            symbol: price.symbol.clone().unwrap_or_else(|| normalize(symbol)),
            name: price.long_name.or(price.short_name),
            sector: profile.sector,
            industry: profile.industry,
            country: profile.country,
            website: profile.website,
            market_cap: raw(&price.market_cap)
                .filter(|v| *v >= 0.0)
                .map(|v| v.round() as u64),
            currency: price.currency,
        }
    }

    fn into_analyst(self, symbol: &str) -> AnalystSummary {
        let price = self.price.unwrap_or_default();
        let fin = self.financial_data.unwrap_or_default();

        let trend = self.recommendation_trend.and_then(|t| {
            t.trend
                .into_iter()
                .find(|row| row.period == "0m")
                .map(|row| RecommendationTrend {
                    strong_buy: row.strong_buy,
                    buy: row.buy,
                    hold: row.hold,
                    sell: row.sell,
                    strong_sell: row.strong_sell,
                })
        });

        AnalystSummary {
            symbol: price.symbol.clone().unwrap_or_else(|| normalize(symbol)),
            recommendation: fin.recommendation_key.filter(|k| k != "none"),
            recommendation_mean: raw(&fin.recommendation_mean),
            analyst_count: raw(&fin.number_of_analyst_opinions).map(|v| v as u32),
            current_price: raw(&fin.current_price).or(raw(&price.regular_market_price)),
            target_low: raw(&fin.target_low_price),
            target_mean: raw(&fin.target_mean_price),
            target_high: raw(&fin.target_high_price),
            currency: price.currency,
            trend,
        }
    }
}
