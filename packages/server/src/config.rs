use std::time::Duration;

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::common::GridLayout;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. When unset the in-memory store is used.
    pub database_url: Option<String>,
    pub port: u16,
    /// Bearer credential for the admin endpoints
    pub admin_api_key: Option<String>,
    pub rotation_interval: Duration,
    pub layout: GridLayout,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let rotation_minutes: u64 = env::var("ROTATION_INTERVAL_MINUTES")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .context("ROTATION_INTERVAL_MINUTES must be a valid number")?;
        let rotation_interval = rotation_interval(rotation_minutes)?;

        let squares_per_page: u32 = env::var("SQUARES_PER_PAGE")
            .unwrap_or_else(|_| GridLayout::DEFAULT_SQUARES_PER_PAGE.to_string())
            .parse()
            .context("SQUARES_PER_PAGE must be a valid number")?;
        let page_count: u32 = env::var("PAGE_COUNT")
            .unwrap_or_else(|_| GridLayout::DEFAULT_PAGE_COUNT.to_string())
            .parse()
            .context("PAGE_COUNT must be a valid number")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            admin_api_key: env::var("ADMIN_API_KEY").ok().filter(|s| !s.is_empty()),
            rotation_interval,
            layout: GridLayout::new(squares_per_page, page_count)?,
        })
    }
}

fn rotation_interval(minutes: u64) -> Result<Duration> {
    if minutes == 0 {
        bail!("ROTATION_INTERVAL_MINUTES must be greater than zero");
    }
    let Some(secs) = minutes.checked_mul(60) else {
        bail!("ROTATION_INTERVAL_MINUTES is too large");
    };
    Ok(Duration::from_secs(secs))
}
