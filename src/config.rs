use std::env;

use crate::crawler::models::ListingKind;

pub struct Config {
    pub kind: ListingKind,
    pub city: String,
    pub districts: Vec<String>,
    pub api_base: String,
    pub post_base: String,
    /// How far back the cursor walk goes, in days.
    pub lookback_days: i64,
    pub delay_ms: u64,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            kind: ListingKind::parse(&env_or("DIVAR_LIST_TYPE", "rent"))?,
            city: env_or("DIVAR_CITY", "4"),
            districts: env::var("DIVAR_DISTRICTS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            api_base: env_or("DIVAR_API_BASE", "https://api.divar.ir/v8/web-search"),
            post_base: env_or("DIVAR_POST_BASE", "https://divar.ir/v"),
            lookback_days: env_or("LOOKBACK_DAYS", "14").parse()?,
            delay_ms: env_or("DELAY_MS", "300").parse()?,
            database_url: env::var("DATABASE_URL")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
