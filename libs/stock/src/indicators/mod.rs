pub mod bollinger;

pub use bollinger::{BandPoint, BandPosition, Bollinger, BollingerBands, compute_bollinger};
