use thiserror::Error;

/// Everything that can go wrong between a raw ticker and a rendered answer.
#[derive(Debug, Error)]
pub enum StockError {
    /// Symbol does not resolve to a known instrument.
    #[error("invalid ticker: {0}")]
    InvalidTicker(String),

    /// Exchange name is not in the suffix table.
    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    /// Series too short for the requested window.
    #[error("insufficient data: need {required} prices, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Network, decoding or payload-shape failure from the data source.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("provider returned HTTP {status} for {url}")]
    ProviderStatus { status: u16, url: String },

    #[error("render error: {0}")]
    Render(String),

    #[error("cache error: {0}")]
    Cache(String),
}

impl StockError {
    pub fn provider(msg: impl Into<String>) -> Self {
        StockError::Provider(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        StockError::Render(msg.into())
    }

    /// True for a 404 from the provider, which Yahoo uses for unknown symbols.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StockError::ProviderStatus { status: 404, .. })
    }
}

impl From<reqwest::Error> for StockError {
    fn from(err: reqwest::Error) -> Self {
        match (err.status(), err.url()) {
            (Some(status), Some(url)) => StockError::ProviderStatus {
                status: status.as_u16(),
                url: url.to_string(),
            },
            _ => StockError::Provider(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StockError {
    fn from(err: serde_json::Error) -> Self {
        StockError::Provider(format!("decode failed: {err}"))
    }
}

impl From<sqlx::Error> for StockError {
    fn from(err: sqlx::Error) -> Self {
        StockError::Cache(err.to_string())
    }
}

pub type Result<T, E = StockError> = std::result::Result<T, E>;
