use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Lookback window passed to the chart endpoint as `range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day1,
    Month1,
    Month3,
    Month6,
    Year1,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day1 => "1d",
            Period::Month1 => "1mo",
            Period::Month3 => "3mo",
            Period::Month6 => "6mo",
            Period::Year1 => "1y",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

#[derive(Debug, Clone)]
pub struct PriceHistory {
    pub symbol: String,
    pub currency: Option<String>,
    /// Exchange-local zone, used to label daily bars.
    pub timezone: Tz,
    pub regular_market_price: Option<f64>,
    /// Ascending by timestamp, rows without a close already dropped.
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    pub fn change(&self) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some(last.close - first.close)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub market_cap: Option<u64>,
    pub currency: Option<String>,
}

/// Analyst counts for a single month of Yahoo's recommendation trend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecommendationTrend {
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

impl RecommendationTrend {
    pub fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalystSummary {
    pub symbol: String,
    pub recommendation: Option<String>,
    /// 1.0 strong buy .. 5.0 strong sell.
    pub recommendation_mean: Option<f64>,
    pub analyst_count: Option<u32>,
    pub current_price: Option<f64>,
    pub target_low: Option<f64>,
    pub target_mean: Option<f64>,
    pub target_high: Option<f64>,
    pub currency: Option<String>,
    pub trend: Option<RecommendationTrend>,
}

impl AnalystSummary {
    /// Percent gap between the mean target and the current price.
    pub fn upside_pct(&self) -> Option<f64> {
        let current = self.current_price.filter(|p| *p > 0.0)?;
        let target = self.target_mean?;
        Some((target / current - 1.0) * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn history_change_uses_first_and_last_close() {
        let history = PriceHistory {
            symbol: "AAPL".into(),
            currency: Some("USD".into()),
            timezone: chrono_tz::America::New_York,
            regular_market_price: None,
            points: vec![
                PricePoint {
                    timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                    close: 10.0,
                },
                PricePoint {
                    timestamp: Utc.timestamp_opt(1_700_086_400, 0).unwrap(),
                    close: 7.5,
                },
            ],
        };

        assert_eq!(history.change(), Some(-2.5));
        assert_eq!(history.last_close(), Some(7.5));
    }

    #[test]
    fn upside_needs_a_positive_price() {
        let mut summary = AnalystSummary {
            current_price: Some(100.0),
            target_mean: Some(125.0),
            ..Default::default()
        };
        assert!((summary.upside_pct().unwrap() - 25.0).abs() < 1e-9);

        summary.current_price = Some(0.0);
        assert_eq!(summary.upside_pct(), None);
    }
}
