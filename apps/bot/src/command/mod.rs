mod analyst;
mod basic_info;
mod bollinger;
mod choice;
mod price;

use poise::{Command, FrameworkError};
use serenity::all::{CreateEmbed, CreateEmbedFooter};
use stock::StockError;
use tracing::{error, warn};

use crate::{Data, Error};

pub use choice::{ExchangeChoice, PeriodChoice};

pub const EMBED_COLOR_PRIMARY: u32 = 0x3498db;
pub const EMBED_COLOR_UP: u32 = 0x00d084;
pub const EMBED_COLOR_DOWN: u32 = 0xff4d4f;

/// Every command the bot registers.
pub fn commands() -> Vec<Command<Data, Error>> {
    vec![
        price::price(),
        basic_info::basic_info(),
        bollinger::bollinger(),
        analyst::analyst(),
    ]
}

/// Embed with the shared colour and footer.
pub fn base_embed(data: &Data, title: impl Into<String>) -> CreateEmbed {
    CreateEmbed::default()
        .title(title)
        .color(EMBED_COLOR_PRIMARY)
        .footer(CreateEmbedFooter::new(data.footer.as_str()))
}

/// What the requester sees when a command fails.
pub fn user_message(error: &Error) -> String {
    match error.downcast_ref::<StockError>() {
        Some(StockError::InvalidTicker(ticker)) => {
            format!("The ticker '{ticker}' is not valid. Please check and try again.")
        }
        Some(StockError::UnknownExchange(exchange)) => {
            format!("The exchange '{exchange}' is not supported.")
        }
        Some(StockError::InsufficientData { required, actual }) => format!(
            "Not enough price history: need {required} trading days, found {actual}. Try a longer period."
        ),
        Some(StockError::Render(_)) => {
            "The chart could not be generated. Please try again later.".to_string()
        }
        _ => "An error occurred while fetching market data. Please try again later.".to_string(),
    }
}

pub async fn on_error(error: FrameworkError<'_, Data, Error>) {
    match error {
        FrameworkError::Command { error, ctx, .. } => {
            error!(
                command = %ctx.command().qualified_name,
                user_id = ctx.author().id.get(),
                error = ?error,
                "command failed"
            );

            if let Err(e) = ctx.say(user_message(&error)).await {
                warn!(error = ?e, "failed to report command error");
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!(error = ?e, "error while handling framework error");
            }
        }
    }
}
