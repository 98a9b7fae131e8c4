use poise::CreateReply;
use serenity::all::CreateAttachment;
use stock::{
    Period, chart,
    format::{display_opt2, display2},
    indicators::{BandPosition, BollingerBands},
    resolve_full_symbol, service,
};
use tracing::{debug, info};

use super::{
    EMBED_COLOR_DOWN, EMBED_COLOR_PRIMARY, EMBED_COLOR_UP, base_embed,
    choice::{ExchangeChoice, PeriodChoice},
};
use crate::{Context, Error};

const FILENAME: &str = "bollinger.png";
const CHART_POINTS: usize = 20;

/// Calculate Bollinger Bands for a given ticker symbol.
#[poise::command(slash_command, prefix_command)]
pub async fn bollinger(
    ctx: Context<'_>,
    #[description = "The ticker symbol of the stock"] ticker: String,
    #[description = "History to fetch (needs at least 20 trading days)"] period: Option<
        PeriodChoice,
    >,
    #[description = "The stock exchange where the ticker is listed"] exchange: Option<
        ExchangeChoice,
    >,
) -> Result<(), Error> {
    ctx.defer().await?;

    let period: Period = period.unwrap_or(PeriodChoice::Month3).into();
    let symbol = resolve_full_symbol(&ticker, ExchangeChoice::lookup_name(exchange))?;
    info!(symbol = %symbol, %period, "bollinger: invoked");

    let data = ctx.data();
    let report = service::bollinger_report(
        data.price_client.as_ref(),
        &symbol,
        period,
        BollingerBands::default().with_trailing(CHART_POINTS),
    )
    .await?;

    let latest = report.bands.latest;
    let tz = report.history.timezone;
    info!(
        symbol = %symbol,
        close = latest.price,
        mean = latest.mean,
        upper = latest.upper,
        lower = latest.lower,
        "bollinger: computed"
    );

    debug!(symbol = %symbol, "bollinger: rendering chart");
    let bands = report.bands.clone();
    let chart_symbol = symbol.clone();
    let png = data
        .workers
        .run(move || chart::render_bollinger_chart(&chart_symbol, &bands, tz))
        .await??;

    let (position, color) = match latest.position() {
        BandPosition::AboveUpper => ("Above the upper band", EMBED_COLOR_UP),
        BandPosition::BelowLower => ("Below the lower band", EMBED_COLOR_DOWN),
        BandPosition::Inside => ("Inside the bands", EMBED_COLOR_PRIMARY),
    };

    let as_of = latest.timestamp.with_timezone(&tz).format("%Y-%m-%d");
    let embed = base_embed(data, format!("Bollinger Bands for {}", symbol.to_uppercase()))
        .description(format!(
            "{}-day moving average ± {}σ, as of {as_of}",
            report.bands.window, report.bands.k
        ))
        .color(color)
        .field("Close", display2(latest.price), true)
        .field(
            format!("Moving Average ({})", report.bands.window),
            display2(latest.mean),
            true,
        )
        .field("Position", position, true)
        .field("Upper Band", display2(latest.upper), true)
        .field("Lower Band", display2(latest.lower), true)
        .field("Band Width", format!("{}%", display_opt2(latest.width_pct())), true)
        .image(format!("attachment://{FILENAME}"));

    ctx.send(
        CreateReply::default()
            .embed(embed)
            .attachment(CreateAttachment::bytes(png, FILENAME)),
    )
    .await?;

    info!(symbol = %symbol, "bollinger: sent");
    Ok(())
}
