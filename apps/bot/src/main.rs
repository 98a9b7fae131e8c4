use std::sync::Arc;

use anyhow::{Context, Result};
use finbot::{Data, WorkerPool, command, config::Config};
use poise::{Framework, FrameworkOptions, PrefixFrameworkOptions};
use serenity::all::{ClientBuilder, GatewayIntents};
use stock::PriceClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .init();

    info!(
        version = %config.version,
        prefix = ?config.command_prefix,
        debug = config.debug,
        workers = config.worker_threads,
        "configuration loaded"
    );

    let price_client = Arc::new(
        PriceClient::from_env()
            .await
            .context("init price client failed")?,
    );
    let workers = WorkerPool::new(config.worker_threads);
    let footer = format!("Data from Yahoo Finance · finbot {}", config.version);

    let mut intents = GatewayIntents::non_privileged();
    if config.command_prefix.is_some() {
        intents |= GatewayIntents::MESSAGE_CONTENT;
    }

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: command::commands(),
            on_error: |error| Box::pin(command::on_error(error)),
            prefix_options: PrefixFrameworkOptions {
                prefix: config.command_prefix.clone(),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup({
            let price_client = Arc::clone(&price_client);

            move |ctx, ready, framework| {
                Box::pin(async move {
                    info!(
                        "{} [{}] connected successfully!",
                        ready.user.name, ready.user.id
                    );

                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!(
                        commands = framework.options().commands.len(),
                        "registered slash commands"
                    );

                    Ok(Data {
                        price_client,
                        workers,
                        footer,
                    })
                })
            }
        })
        .build();

    let mut client = ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("failed to create discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(why) = client.start().await {
            error!("Client error: {why:?}");
        }
    });

    shutdown_signal().await;

    shard_manager.shutdown_all().await;
    price_client.session().close().await;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                select! {
                    _ = sigterm.recv() => {},
                    _ = sigint.recv()  => {},
                }
            }
            _ => {
                error!("failed to install signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
