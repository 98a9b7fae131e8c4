use std::str::FromStr;

use isocountry::CountryCode;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round to cents, half away from zero.
///
/// Works on the shortest decimal form of `x` rather than its binary value, so
/// `10.505` becomes `10.51` even though the nearest `f64` sits just below it.
pub fn round2(x: f64) -> Option<Decimal> {
    if !x.is_finite() {
        return None;
    }

    Decimal::from_str(&x.to_string())
        .ok()
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Two-decimal display value; `n/a` for NaN or infinities.
pub fn display2(x: f64) -> String {
    match round2(x) {
        Some(d) => format!("{d:.2}"),
        // Too large for a Decimal.
        None if x.is_finite() => format!("{x:.2}"),
        None => "n/a".to_string(),
    }
}

pub fn display_opt2(x: Option<f64>) -> String {
    x.map(display2).unwrap_or_else(|| "n/a".to_string())
}

/// `1234567` -> `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Yahoo spellings that differ from the ISO 3166 short names.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("United States", "US"),
    ("United Kingdom", "GB"),
    ("South Korea", "KR"),
    ("Taiwan", "TW"),
    ("Russia", "RU"),
    ("Vietnam", "VN"),
    ("Philippines", "PH"),
    ("Czech Republic", "CZ"),
    ("Macau", "MO"),
    ("Turkey", "TR"),
    ("Netherlands", "NL"),
    ("Iran", "IR"),
    ("Bolivia", "BO"),
    ("Venezuela", "VE"),
    ("Tanzania", "TZ"),
    ("Laos", "LA"),
    ("Moldova", "MD"),
    ("Syria", "SY"),
    ("British Virgin Islands", "VG"),
    ("Curacao", "CW"),
];

/// ISO 3166 alpha-2 code for a country name, alias, or alpha-2/alpha-3 code.
pub fn country_code(country: &str) -> Option<&'static str> {
    let country = country.trim();
    if country.is_empty() {
        return None;
    }

    if let Some((_, code)) = COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(country))
    {
        return Some(code);
    }

    CountryCode::iter()
        .find(|c| {
            c.name().eq_ignore_ascii_case(country)
                || c.alpha2().eq_ignore_ascii_case(country)
                || c.alpha3().eq_ignore_ascii_case(country)
        })
        .map(|c| c.alpha2())
}

/// Regional-indicator flag for a country name, e.g. `France` -> 🇫🇷.
pub fn country_flag(country: &str) -> Option<String> {
    country_code(country)?
        .chars()
        .map(|c| char::from_u32(c.to_ascii_uppercase() as u32 + 127_397))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(display2(10.505), "10.51");
        assert_eq!(display2(1.005), "1.01");
        assert_eq!(display2(2.675), "2.68");
        assert_eq!(display2(-2.345), "-2.35");
        assert_eq!(display2(10.504), "10.50");
    }

    #[test]
    fn pads_to_two_decimals() {
        assert_eq!(display2(3.0), "3.00");
        assert_eq!(display2(0.1), "0.10");
        assert_eq!(display2(22.332_495_807_1), "22.33");
    }

    #[test]
    fn non_finite_is_not_a_number() {
        assert_eq!(display2(f64::NAN), "n/a");
        assert_eq!(display2(f64::INFINITY), "n/a");
        assert_eq!(display_opt2(None), "n/a");
        assert_eq!(round2(f64::NAN), None);
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(2_950_000_000_000), "2,950,000,000,000");
    }

    #[test]
    fn flags_from_country_names() {
        assert_eq!(country_flag("France").as_deref(), Some("🇫🇷"));
        assert_eq!(country_flag("united states").as_deref(), Some("🇺🇸"));
        assert_eq!(country_flag("Atlantis"), None);
        assert_eq!(country_flag("  "), None);
    }

    #[test]
    fn flags_cover_iso_names() {
        for (name, flag) in [
            ("Thailand", "🇹🇭"),
            ("Malaysia", "🇲🇾"),
                    ("Colombia", "🇨🇴"),
            ("Puerto Rico", "🇵🇷"),
            ("Monaco", "🇲🇨"),
            ("Japan", "🇯🇵"),
        ] {
            assert_eq!(country_flag(name).as_deref(), Some(flag), "{name}");
        }
    }

    #[test]
    fn flags_cover_yahoo_spellings() {
        for (name, code) in [
            ("Russia", "RU"),
            ("Vietnam", "VN"),
            ("Czech Republic", "CZ"),
            ("Macau", "MO"),
            ("Philippines", "PH"),
            ("South Korea", "KR"),
            ("Taiwan", "TW"),
            ("United Kingdom", "GB"),
        ] {
            assert_eq!(country_code(name), Some(code), "{name}");
        }
        assert_eq!(country_code("deu"), Some("DE"));
    }
}
