//! Concurrent scraping of a contiguous range of game ids.
//!
//! Every id goes through fetch → retry → extract and yields exactly one
//! [`CorpusEntry`]. At most `concurrency` games are in flight at once;
//! extraction runs on the same task right after its fetch completes.
//! Results come back in completion order; the corpus writer re-sorts.

use futures::stream::{self, StreamExt};
use std::ops::RangeInclusive;

use crate::config::ScrapeConfig;
use crate::extract::extract_game;
use crate::fetch::{game_url, FetchError, Fetcher};
use crate::models::{CorpusEntry, MissingGame};
use crate::progress::{should_report, ScrapeProgressEvent, ScrapeProgressReporter};
use crate::retry::{get_with_retry, RetryPolicy};

pub const RETRIES_EXHAUSTED: &str = "Failed after multiple retries";

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub base_url: String,
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

impl ScrapeOptions {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            concurrency: config.concurrency.max(1),
            retry: RetryPolicy::from_config(config),
        }
    }
}

/// Scrape every id in `ids`, returning one entry per id in no particular order.
pub async fn scrape_range(
    fetcher: &dyn Fetcher,
    ids: RangeInclusive<u32>,
    options: &ScrapeOptions,
    progress: &dyn ScrapeProgressReporter,
) -> Vec<CorpusEntry> {
    let total = ids.clone().count() as u64;
    let mut entries = Vec::with_capacity(total as usize);

    let mut games = stream::iter(ids)
        .map(|game_id| scrape_game(fetcher, game_id, options))
        .buffer_unordered(options.concurrency.max(1));

    while let Some(entry) = games.next().await {
        entries.push(entry);
        let done = entries.len() as u64;
        if should_report(done, total) {
            progress.report(ScrapeProgressEvent::Scraping { done, total });
        }
    }

    entries
}

/// Fetch and extract a single game, folding every failure into a [`MissingGame`].
pub async fn scrape_game(fetcher: &dyn Fetcher, game_id: u32, options: &ScrapeOptions) -> CorpusEntry {
    let url = game_url(&options.base_url, game_id);

    match get_with_retry(fetcher, &url, &options.retry).await {
        Ok(body) => extract_game(&body, game_id),
        Err(e @ FetchError::RetryExhausted { .. }) => {
            tracing::warn!(game_id, error = %e, "giving up on game");
            MissingGame::new(game_id, RETRIES_EXHAUSTED).into()
        }
        Err(e) => {
            tracing::info!(game_id, error = %e, "game page unavailable");
            MissingGame::new(game_id, format!("{} for game {}", e, game_id)).into()
        }
    }
}
