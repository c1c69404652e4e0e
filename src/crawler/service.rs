use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::crawler::{extract, fetcher, parser};
use crate::storage::sqlite::{InsertOutcome, Storage};

const DAY_US: i64 = 86_400 * 1_000_000;

/// Whether the crawl keeps walking after a post. `Halt` means storage saw a
/// duplicate token: the walk has reached history saved by a previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    Continue,
    Halt,
}

pub struct ScrapingService {
    cfg: Config,
    storage: Storage,
    client: Client,
}

impl ScrapingService {
    pub async fn new(cfg: Config) -> anyhow::Result<Self> {
        let storage = Storage::new(&cfg.database_url).await?;
        let client = fetcher::build_client();
        Ok(Self { cfg, storage, client })
    }

    /// Walks the list endpoint from now toward older batches, fetching and
    /// saving every post, until a batch falls behind the lookback window, a
    /// batch comes back empty, or a duplicate signals we have caught up.
    pub async fn run(&self) -> anyhow::Result<()> {
        let lookback_us = self.cfg.lookback_days * DAY_US;
        let mut cursor = now_micros();
        let mut total_saved = 0usize;

        loop {
            debug!(cursor, "Fetching listing batch");
            let page = fetcher::fetch_list_page(&self.client, &self.cfg, cursor).await?;

            let tokens = page.tokens();
            if tokens.is_empty() {
                info!(cursor, "Empty batch, stopping");
                break;
            }
            let batch_sort_date = page.last_post_sort_date();
            info!(count = tokens.len(), "Processing batch");

            for token in &tokens {
                match self.process_post(token, batch_sort_date.unwrap_or(cursor)).await {
                    Ok(CrawlStatus::Continue) => total_saved += 1,
                    Ok(CrawlStatus::Halt) => {
                        info!(
                            token = %token,
                            total_saved,
                            "Duplicate post, caught up with saved history"
                        );
                        return Ok(());
                    }
                    Err(e) => warn!(token = %token, error = %e, "Failed to process post"),
                }

                tokio::time::sleep(std::time::Duration::from_millis(self.cfg.delay_ms)).await;
            }

            // Without a sort date the cursor cannot advance; refetching the
            // same batch would terminate only through the duplicate halt.
            let Some(next_cursor) = batch_sort_date else {
                warn!(cursor, "Batch carries no sort date, stopping");
                break;
            };
            if !cursor_is_fresh(next_cursor, now_micros(), lookback_us) {
                info!(next_cursor, "Batch older than lookback window, stopping");
                break;
            }
            cursor = next_cursor;
        }

        info!(total_saved, "Crawl finished");
        Ok(())
    }

    async fn process_post(&self, token: &str, sort_date: i64) -> anyhow::Result<CrawlStatus> {
        let url = format!("{}/{}", self.cfg.post_base, token);
        debug!(token, "Fetching post page");

        let html = fetcher::fetch_post_html(&self.client, &url).await?;
        let page = parser::parse_post_page(&html);
        let listing = extract::build_listing(self.cfg.kind, token, &url, &page, sort_date);

        match self.storage.insert_listing(&listing).await? {
            InsertOutcome::Inserted => Ok(CrawlStatus::Continue),
            InsertOutcome::Duplicate => Ok(CrawlStatus::Halt),
        }
    }
}

/// Batches arrive newest first; the walk continues while the batch cursor is
/// strictly younger than `now - lookback`.
pub fn cursor_is_fresh(last_post_sort_date: i64, now_us: i64, lookback_us: i64) -> bool {
    last_post_sort_date > now_us - lookback_us
}

fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}
