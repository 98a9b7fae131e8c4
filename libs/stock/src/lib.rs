mod cache;
mod error;
mod price_client;
mod rate_limit;
mod session;

pub mod chart;
pub mod exchange;
pub mod format;
pub mod indicators;
pub mod models;
pub mod service;

pub use cache::ResponseCache;
pub use error::{Result, StockError};
pub use exchange::{DEFAULT_EXCHANGE, EXCHANGES, resolve_full_symbol};
pub use models::{AnalystSummary, CompanyProfile, Period, PriceHistory, PricePoint};
pub use price_client::PriceClient;
pub use rate_limit::{RateLimit, RateLimiter};
pub use session::{Session, SessionConfig};
