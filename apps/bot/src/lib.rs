use std::sync::Arc;

use stock::PriceClient;

pub mod command;
pub mod config;
pub mod worker;

pub use worker::WorkerPool;

pub struct Data {
    pub price_client: Arc<PriceClient>,
    pub workers: WorkerPool,
    /// Footer text shared by every embed.
    pub footer: String,
}

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;
