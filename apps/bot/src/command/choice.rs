use poise::ChoiceParameter;
use stock::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum PeriodChoice {
    #[name = "1 month"]
    Month1,
    #[name = "3 months"]
    Month3,
    #[name = "6 months"]
    Month6,
    #[name = "1 year"]
    Year1,
}

impl From<PeriodChoice> for Period {
    fn from(choice: PeriodChoice) -> Self {
        match choice {
            PeriodChoice::Month1 => Period::Month1,
            PeriodChoice::Month3 => Period::Month3,
            PeriodChoice::Month6 => Period::Month6,
            PeriodChoice::Year1 => Period::Year1,
        }
    }
}

/// Exchanges offered to users; each `name` is a key of `stock::EXCHANGES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ExchangeChoice {
    #[name = "NYSE"]
    Nyse,
    #[name = "NASDAQ"]
    Nasdaq,
    #[name = "Euronext Paris"]
    EuronextParis,
    #[name = "Euronext Amsterdam"]
    EuronextAmsterdam,
    #[name = "Euronext Brussels"]
    EuronextBrussels,
    #[name = "London Stock Exchange"]
    London,
    #[name = "Xetra"]
    Xetra,
    #[name = "Frankfurt Stock Exchange"]
    Frankfurt,
    #[name = "SIX Swiss Exchange"]
    Swiss,
    #[name = "Borsa Italiana"]
    Milan,
    #[name = "Bolsa de Madrid"]
    Madrid,
    #[name = "Tokyo Stock Exchange"]
    Tokyo,
    #[name = "Hong Kong Stock Exchange"]
    HongKong,
    #[name = "Shanghai Stock Exchange"]
    Shanghai,
    #[name = "Shenzhen Stock Exchange"]
    Shenzhen,
    #[name = "Korea Exchange"]
    Korea,
    #[name = "National Stock Exchange of India"]
    India,
    #[name = "Australian Securities Exchange"]
    Australia,
    #[name = "Toronto Stock Exchange"]
    Toronto,
    #[name = "B3"]
    Brazil,
}

impl ExchangeChoice {
    /// Used when the exchange option is left empty.
    pub const DEFAULT: ExchangeChoice = ExchangeChoice::Nyse;

    /// Name for the suffix lookup, with [`ExchangeChoice::DEFAULT`] for `None`.
    pub fn lookup_name(choice: Option<Self>) -> &'static str {
        choice.unwrap_or(Self::DEFAULT).name()
    }
}
