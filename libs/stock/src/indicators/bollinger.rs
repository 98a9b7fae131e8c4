//! Bollinger Bands over daily closes.

use chrono::{DateTime, Utc};
use ta::Next;
use ta::indicators::SimpleMovingAverage;

use crate::{
    error::{Result, StockError},
    models::PricePoint,
};

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_K: f64 = 2.0;

/// Computed bands at one position of the series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub mean: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Where the close sits relative to the bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandPosition {
    AboveUpper,
    Inside,
    BelowLower,
}

impl BandPoint {
    /// Band width relative to the mean, in percent.
    pub fn width_pct(&self) -> Option<f64> {
        (self.mean != 0.0).then(|| (self.upper - self.lower) / self.mean * 100.0)
    }

    pub fn position(&self) -> BandPosition {
        if self.price > self.upper {
            BandPosition::AboveUpper
        } else if self.price < self.lower {
            BandPosition::BelowLower
        } else {
            BandPosition::Inside
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bollinger {
    pub window: usize,
    pub k: f64,
    /// Most recent fully populated position.
    pub latest: BandPoint,
    /// Last valid positions, oldest first, ending with `latest`.
    pub trailing: Vec<BandPoint>,
}

/// Rolling mean ± `k` sample standard deviations over `window` closes.
///
/// The window is positional: calendar gaps between points are not filled.
#[derive(Debug, Clone, Copy)]
pub struct BollingerBands {
    pub window: usize,
    pub k: f64,
    pub trailing: usize,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_K)
    }
}

impl BollingerBands {
    pub fn new(window: usize, k: f64) -> Self {
        Self {
            window,
            k,
            trailing: window,
        }
    }

    /// How many valid positions to keep for charting.
    pub fn with_trailing(mut self, trailing: usize) -> Self {
        self.trailing = trailing.max(1);
        self
    }

    pub fn compute(&self, series: &[PricePoint]) -> Result<Bollinger> {
        // ddof = 1 needs at least two samples.
        if self.window < 2 {
            return Err(StockError::InvalidParams(format!(
                "window must be at least 2, got {}",
                self.window
            )));
        }
        if !self.k.is_finite() || self.k < 0.0 {
            return Err(StockError::InvalidParams(format!(
                "k must be a non-negative number, got {}",
                self.k
            )));
        }
        if series.len() < self.window {
            return Err(StockError::InsufficientData {
                required: self.window,
                actual: series.len(),
            });
        }

        let mut sma = SimpleMovingAverage::new(self.window)
            .map_err(|e| StockError::InvalidParams(format!("{e:?}")))?;

        let first_valid = self.window - 1;
        let keep_from = series.len().saturating_sub(self.trailing).max(first_valid);
        let mut trailing = Vec::with_capacity(series.len() - keep_from);

        for (i, point) in series.iter().enumerate() {
            let mean = sma.next(point.close);
            if i < keep_from {
                continue;
            }

            let slice = &series[i + 1 - self.window..=i];
            let std = sample_std(slice, mean);

            trailing.push(BandPoint {
                timestamp: point.timestamp,
                price: point.close,
                mean,
                upper: mean + self.k * std,
                lower: mean - self.k * std,
            });
        }

        let latest = *trailing
            .last()
            .ok_or(StockError::InsufficientData {
                required: self.window,
                actual: series.len(),
            })?;

        Ok(Bollinger {
            window: self.window,
            k: self.k,
            latest,
            trailing,
        })
    }
}

fn sample_std(slice: &[PricePoint], mean: f64) -> f64 {
    let n = slice.len() as f64;
    let ss: f64 = slice.iter().map(|p| (p.close - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

/// Bands with a `window`-long trailing slice.
pub fn compute_bollinger(series: &[PricePoint], window: usize, k: f64) -> Result<Bollinger> {
    BollingerBands::new(window, k).compute(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 14, 30, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                timestamp: start + Duration::days(i as i64),
                close,
            })
            .collect()
    }

    fn ramp(n: usize) -> Vec<PricePoint> {
        let closes: Vec<f64> = (1..=n).map(|x| x as f64).collect();
        series(&closes)
    }

    #[test]
    fn short_series_is_rejected() {
        for len in [0, 1, 19] {
            let err = compute_bollinger(&ramp(len), DEFAULT_WINDOW, DEFAULT_K).unwrap_err();
            assert!(matches!(
                err,
                StockError::InsufficientData { required: 20, actual } if actual == len
            ));
        }
    }

    #[test]
    fn ramp_of_twenty() {
        let bands = compute_bollinger(&ramp(20), 20, 2.0).unwrap();
        let latest = bands.latest;

        // sample std of 1..=20 is sqrt(35)
        let std = 35.0_f64.sqrt();
        assert!((latest.mean - 10.5).abs() < 1e-10);
        assert!((latest.upper - (10.5 + 2.0 * std)).abs() < 1e-10);
        assert!((latest.lower - (10.5 - 2.0 * std)).abs() < 1e-10);
        assert!((latest.upper - 22.33).abs() < 0.005);
        assert!((latest.lower + 1.33).abs() < 0.005);
        assert_eq!(latest.price, 20.0);
        assert_eq!(bands.trailing.len(), 1);
    }

    #[test]
    fn constant_series_has_zero_width() {
        let bands = compute_bollinger(&series(&[42.0; 30]), 20, 2.0).unwrap();
        for p in &bands.trailing {
            assert!((p.mean - 42.0).abs() < 1e-10);
            assert!((p.upper - 42.0).abs() < 1e-10);
            assert!((p.lower - 42.0).abs() < 1e-10);
        }
        assert_eq!(bands.trailing.len(), 11);
    }

    #[test]
    fn trailing_slice_ends_at_latest() {
        let points = ramp(60);
        let bands = BollingerBands::default()
            .with_trailing(20)
            .compute(&points)
            .unwrap();

        assert_eq!(bands.trailing.len(), 20);
        assert_eq!(bands.trailing.last(), Some(&bands.latest));
        assert_eq!(bands.trailing[0].timestamp, points[40].timestamp);

        // ramp window ending at value v has mean v - 9.5
        for p in &bands.trailing {
            assert!((p.mean - (p.price - 9.5)).abs() < 1e-9);
            assert!(p.upper > p.mean && p.lower < p.mean);
        }
    }

    #[test]
    fn bands_are_symmetric() {
        let points = series(&[
            10.0, 11.0, 9.5, 12.0, 13.0, 12.5, 11.0, 10.0, 9.0, 9.5, 10.5, 11.5, 12.0, 12.5,
            13.5, 14.0, 13.0, 12.0, 11.5, 11.0, 10.0, 10.5,
        ]);
        let bands = compute_bollinger(&points, 20, 2.0).unwrap();
        for p in &bands.trailing {
            assert!(((p.upper - p.mean) - (p.mean - p.lower)).abs() < 1e-10);
        }
    }

    #[test]
    fn repeated_runs_match() {
        let points = series(&[5.0, 6.0, 7.0, 6.5, 6.0, 5.5, 5.0, 4.5, 5.0, 6.0, 7.0, 8.0, 7.5, 7.0, 6.5, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0]);
        let first = compute_bollinger(&points, 20, 2.0).unwrap();
        let second = compute_bollinger(&points, 20, 2.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        let points = ramp(30);
        assert!(matches!(
            compute_bollinger(&points, 1, 2.0),
            Err(StockError::InvalidParams(_))
        ));
        assert!(matches!(
            compute_bollinger(&points, 20, f64::NAN),
            Err(StockError::InvalidParams(_))
        ));
        assert!(matches!(
            compute_bollinger(&points, 20, -1.0),
            Err(StockError::InvalidParams(_))
        ));
    }

    #[test]
    fn width_is_relative_to_mean() {
        let p = BandPoint {
            timestamp: Utc::now(),
            price: 100.0,
            mean: 100.0,
            upper: 110.0,
            lower: 90.0,
        };
        assert_eq!(p.width_pct(), Some(20.0));
        assert_eq!(p.position(), BandPosition::Inside);
        assert_eq!(
            BandPoint { price: 111.0, ..p }.position(),
            BandPosition::AboveUpper
        );
        assert_eq!(
            BandPoint { price: 89.0, ..p }.position(),
            BandPosition::BelowLower
        );
    }
}
