use std::env::var;

use anyhow::{Context, Result, bail};

const DEFAULT_WORKER_THREADS: usize = 4;

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    /// Prefix commands are only registered when this is set.
    pub command_prefix: Option<String>,
    pub debug: bool,
    pub version: String,
    pub worker_threads: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .context("DISCORD_TOKEN not set")?;

        let debug = match lookup("DEBUG_MODE") {
            Some(raw) => parse_bool(&raw)
                .with_context(|| format!("DEBUG_MODE={raw} is not a boolean"))?,
            None => false,
        };

        let worker_threads = match lookup("WORKER_THREADS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("WORKER_THREADS={raw} is not a number"))?,
            None => DEFAULT_WORKER_THREADS,
        };
        if worker_threads == 0 {
            bail!("WORKER_THREADS must be at least 1");
        }

        Ok(Self {
            discord_token,
            command_prefix: lookup("COMMAND_PREFIX").filter(|p| !p.trim().is_empty()),
            debug,
            version: lookup("APP_VERSION").unwrap_or_else(|| "Unknown".to_string()),
            worker_threads,
        })
    }

    pub fn default_log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
