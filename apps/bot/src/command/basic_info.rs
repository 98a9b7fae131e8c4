use poise::CreateReply;
use stock::{format, resolve_full_symbol, service};
use tracing::info;

use super::{base_embed, choice::ExchangeChoice};
use crate::{Context, Error};

fn or_na(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("n/a")
        .to_string()
}

/// Get basic information for a given ticker symbol.
#[poise::command(slash_command, prefix_command)]
pub async fn basic_info(
    ctx: Context<'_>,
    #[description = "The ticker symbol of the stock"] ticker: String,
    #[description = "The stock exchange where the ticker is listed"] exchange: Option<
        ExchangeChoice,
    >,
) -> Result<(), Error> {
    ctx.defer().await?;

    let symbol = resolve_full_symbol(&ticker, ExchangeChoice::lookup_name(exchange))?;
    info!(symbol = %symbol, "basic_info: invoked");

    let data = ctx.data();
    let profile = service::company_overview(data.price_client.as_ref(), &symbol).await?;

    let country = match profile.country.as_deref() {
        Some(country) => match format::country_flag(country) {
            Some(flag) => format!("{flag} {country}"),
            None => country.to_string(),
        },
        None => "n/a".to_string(),
    };

    let market_cap = match profile.market_cap {
        Some(cap) => format!(
            "{} {}",
            format::thousands(cap),
            profile.currency.as_deref().unwrap_or_default()
        )
        .trim_end()
        .to_string(),
        None => "n/a".to_string(),
    };

    let mut embed = base_embed(data, format!("Basic Information for {}", symbol.to_uppercase()))
        .field("Name", or_na(profile.name.as_deref()), false)
        .field("Sector", or_na(profile.sector.as_deref()), true)
        .field("Industry", or_na(profile.industry.as_deref()), true)
        .field("Country", country, true)
        .field("Market Cap", market_cap, false);

    if let Some(website) = profile.website.as_deref() {
        embed = embed.url(website);
    }

    ctx.send(CreateReply::default().embed(embed)).await?;

    info!(symbol = %symbol, "basic_info: sent");
    Ok(())
}
