use crate::error::{Result, StockError};

/// Exchange name and the suffix Yahoo expects after the local symbol.
///
/// US venues carry no suffix. Names are what users pick from the command
/// choices, so keep them stable.
pub const EXCHANGES: &[(&str, &str)] = &[
    ("NYSE", ""),
    ("NASDAQ", ""),
    ("Euronext Paris", ".PA"),
    ("Euronext Amsterdam", ".AS"),
    ("Euronext Brussels", ".BR"),
    ("London Stock Exchange", ".L"),
    ("Xetra", ".DE"),
    ("Frankfurt Stock Exchange", ".F"),
    ("SIX Swiss Exchange", ".SW"),
    ("Borsa Italiana", ".MI"),
    ("Bolsa de Madrid", ".MC"),
    ("Tokyo Stock Exchange", ".T"),
    ("Hong Kong Stock Exchange", ".HK"),
    ("Shanghai Stock Exchange", ".SS"),
    ("Shenzhen Stock Exchange", ".SZ"),
    ("Korea Exchange", ".KS"),
    ("National Stock Exchange of India", ".NS"),
    ("Australian Securities Exchange", ".AX"),
    ("Toronto Stock Exchange", ".TO"),
    ("B3", ".SA"),
];

pub const DEFAULT_EXCHANGE: &str = "NYSE";

/// Suffix for an exchange name, matched case-insensitively.
pub fn suffix_for(exchange: &str) -> Option<&'static str> {
    let exchange = exchange.trim();
    EXCHANGES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(exchange))
        .map(|(_, suffix)| *suffix)
}

pub fn normalize(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Build the provider symbol for `raw` listed on `exchange`.
///
/// A symbol that already carries the exchange suffix is left alone, so
/// `MC.PA` on Euronext Paris stays `MC.PA`.
pub fn resolve_full_symbol(raw: &str, exchange: &str) -> Result<String> {
    let symbol = normalize(raw);
    if symbol.is_empty() {
        return Err(StockError::InvalidTicker(raw.to_string()));
    }

    let suffix =
        suffix_for(exchange).ok_or_else(|| StockError::UnknownExchange(exchange.to_string()))?;

    if suffix.is_empty() || symbol.ends_with(suffix) {
        Ok(symbol)
    } else {
        Ok(format!("{symbol}{suffix}"))
    }
}
