use poise::CreateReply;
use stock::{
    AnalystSummary,
    format::{display_opt2, display2},
    resolve_full_symbol, service,
};
use tracing::info;

use super::{base_embed, choice::ExchangeChoice};
use crate::{Context, Error};

fn recommendation(summary: &AnalystSummary) -> String {
    let key = summary
        .recommendation
        .as_deref()
        .map(|k| k.replace('_', " ").to_uppercase());

    match (key, summary.recommendation_mean) {
        (Some(key), Some(mean)) => format!("{key} ({})", display2(mean)),
        (Some(key), None) => key,
        (None, Some(mean)) => display2(mean),
        (None, None) => "n/a".to_string(),
    }
}

fn targets(summary: &AnalystSummary) -> String {
    let currency = summary.currency.as_deref().unwrap_or("USD");
    format!(
        "Low {} · Mean {} · High {} {currency}",
        display_opt2(summary.target_low),
        display_opt2(summary.target_mean),
        display_opt2(summary.target_high),
    )
}

fn upside(summary: &AnalystSummary) -> String {
    match summary.upside_pct() {
        Some(pct) if pct >= 0.0 => format!("+{}%", display2(pct)),
        Some(pct) => format!("{}%", display2(pct)),
        None => "n/a".to_string(),
    }
}

/// Get analyst recommendations and price targets for a given ticker symbol.
#[poise::command(slash_command, prefix_command)]
pub async fn analyst(
    ctx: Context<'_>,
    #[description = "The ticker symbol of the stock"] ticker: String,
    #[description = "The stock exchange where the ticker is listed"] exchange: Option<
        ExchangeChoice,
    >,
) -> Result<(), Error> {
    ctx.defer().await?;

    let symbol = resolve_full_symbol(&ticker, ExchangeChoice::lookup_name(exchange))?;
    info!(symbol = %symbol, "analyst: invoked");

    let data = ctx.data();
    let summary = service::analyst_overview(data.price_client.as_ref(), &symbol).await?;

    let mut embed = base_embed(data, format!("Analyst Data for {}", symbol.to_uppercase()))
        .field("Recommendation", recommendation(&summary), true)
        .field(
            "Analysts",
            summary
                .analyst_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "n/a".to_string()),
            true,
        )
        .field("Upside to Mean Target", upside(&summary), true)
        .field("Price Targets", targets(&summary), false);

    if let Some(trend) = summary.trend.filter(|t| t.total() > 0) {
        embed = embed.field(
            "This Month",
            format!(
                "Strong Buy {} · Buy {} · Hold {} · Sell {} · Strong Sell {}",
                trend.strong_buy, trend.buy, trend.hold, trend.sell, trend.strong_sell
            ),
            false,
        );
    }

    ctx.send(CreateReply::default().embed(embed)).await?;

    info!(symbol = %symbol, "analyst: sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use stock::models::RecommendationTrend;

    use super::*;

    fn summary() -> AnalystSummary {
        AnalystSummary {
            symbol: "AAPL".into(),
            recommendation: Some("strong_buy".into()),
            recommendation_mean: Some(1.8),
            analyst_count: Some(38),
            current_price: Some(200.0),
            target_low: Some(160.0),
            target_mean: Some(210.02),
            target_high: None,
            currency: Some("USD".into()),
            trend: Some(RecommendationTrend::default()),
        }
    }

    #[test]
    fn formats_recommendation() {
        assert_eq!(recommendation(&summary()), "STRONG BUY (1.80)");
        assert_eq!(recommendation(&AnalystSummary::default()), "n/a");
    }

    #[test]
    fn formats_targets_and_upside() {
        let s = summary();
        assert_eq!(targets(&s), "Low 160.00 · Mean 210.02 · High n/a USD");
        assert_eq!(upside(&s), "+5.01%");

        let down = AnalystSummary {
            target_mean: Some(190.0),
            ..summary()
        };
        assert_eq!(upside(&down), "-5.00%");
    }
}
