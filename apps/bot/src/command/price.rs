use poise::CreateReply;
use serenity::all::CreateAttachment;
use stock::{Period, chart, format, resolve_full_symbol, service};
use tracing::{debug, info};

use super::{
    EMBED_COLOR_DOWN, EMBED_COLOR_UP, base_embed,
    choice::{ExchangeChoice, PeriodChoice},
};
use crate::{Context, Error};

const FILENAME: &str = "price_animation.gif";

/// Get price for a given ticker symbol.
#[poise::command(slash_command, prefix_command)]
pub async fn price(
    ctx: Context<'_>,
    #[description = "The ticker symbol of the stock"] ticker: String,
    #[description = "Time period for the data"] period: Option<PeriodChoice>,
    #[description = "The stock exchange where the ticker is listed"] exchange: Option<
        ExchangeChoice,
    >,
) -> Result<(), Error> {
    ctx.defer().await?;

    let period: Period = period.unwrap_or(PeriodChoice::Month1).into();
    let symbol = resolve_full_symbol(&ticker, ExchangeChoice::lookup_name(exchange))?;
    info!(symbol = %symbol, %period, "price: invoked");

    let data = ctx.data();
    let overview = service::price_overview(data.price_client.as_ref(), &symbol, period).await?;

    debug!(
        symbol = %symbol,
        points = overview.history.points.len(),
        "price: rendering animation"
    );
    let history = overview.history.clone();
    let chart_symbol = symbol.clone();
    let gif = data
        .workers
        .run(move || chart::render_price_animation(&chart_symbol, period, &history))
        .await??;

    let currency = overview.currency.as_deref().unwrap_or("USD");
    let market_cap = overview
        .market_cap
        .map(|cap| format!("{} {currency}", format::thousands(cap)))
        .unwrap_or_else(|| "n/a".to_string());

    let color = match overview.history.change() {
        Some(change) if change > 0.0 => EMBED_COLOR_UP,
        _ => EMBED_COLOR_DOWN,
    };

    let embed = base_embed(data, format!("{} Price Overview", symbol.to_uppercase()))
        .description(format!("Price data for the last {period}"))
        .color(color)
        .field(
            "Current Price",
            format!("{} {currency}", format::display2(overview.current_price)),
            true,
        )
        .field("Market Cap", market_cap, true)
        .image(format!("attachment://{FILENAME}"));

    ctx.send(
        CreateReply::default()
            .embed(embed)
            .attachment(CreateAttachment::bytes(gif, FILENAME)),
    )
    .await?;

    info!(symbol = %symbol, "price: sent");
    Ok(())
}
