//! Refresh orchestration.
//!
//! A refresh is one full pass: scrape every configured id, sort, and
//! atomically replace the corpus. There is no incremental mode; each run
//! rebuilds the whole document. Refreshes may be started concurrently;
//! the atomic replace keeps the file whole, and the last writer wins.

use anyhow::{bail, Result};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::corpus::materialize;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::progress::{NoProgress, ProgressMode, ScrapeProgressEvent, ScrapeProgressReporter};
use crate::scrape::{scrape_range, ScrapeOptions};

/// Outcome of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub games: usize,
    pub missing: usize,
    pub path: PathBuf,
    pub elapsed: Duration,
}

/// Run one refresh against the live upstream.
pub async fn refresh_corpus(
    config: &Config,
    progress: &dyn ScrapeProgressReporter,
) -> Result<RefreshSummary> {
    let fetcher = HttpFetcher::from_config(&config.scrape)?;
    refresh_corpus_with(&fetcher, config, progress).await
}

/// Run one refresh with a caller-supplied fetcher.
pub async fn refresh_corpus_with(
    fetcher: &dyn Fetcher,
    config: &Config,
    progress: &dyn ScrapeProgressReporter,
) -> Result<RefreshSummary> {
    let started = Instant::now();
    let ids = config.scrape.id_range();
    let options = ScrapeOptions::from_config(&config.scrape);

    tracing::info!(
        first_id = ids.start(),
        last_id = ids.end(),
        concurrency = options.concurrency,
        max_attempts = options.retry.max_attempts,
        "refresh started"
    );

    let entries = scrape_range(fetcher, ids, &options, progress).await;

    let path = config.corpus.path.clone();
    progress.report(ScrapeProgressEvent::Writing {
        path: path.clone(),
        entries: entries.len() as u64,
    });
    let entries = materialize(entries, &path)?;

    let missing = entries.iter().filter(|e| e.is_missing()).count();
    let summary = RefreshSummary {
        games: entries.len() - missing,
        missing,
        path,
        elapsed: started.elapsed(),
    };

    tracing::info!(
        games = summary.games,
        missing = summary.missing,
        path = %summary.path.display(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "refresh finished"
    );

    Ok(summary)
}

/// Refresh now, then every `schedule.interval_hours`, forever.
///
/// Runs are serial: the next tick is not taken until the current refresh
/// has finished. A failed run is logged and the loop carries on.
pub async fn run_periodic(config: Config) {
    match HttpFetcher::from_config(&config.scrape) {
        Ok(fetcher) => run_periodic_with(Arc::new(fetcher), config).await,
        Err(e) => tracing::error!(error = %e, "cannot build HTTP client; periodic refresh disabled"),
    }
}

pub async fn run_periodic_with(fetcher: Arc<dyn Fetcher>, config: Config) {
    let mut ticker = tokio::time::interval(config.schedule.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = refresh_corpus_with(fetcher.as_ref(), &config, &NoProgress).await {
            tracing::error!(error = %e, "scheduled refresh failed; previous corpus kept");
        }
    }
}

/// CLI entry point for `jarchive refresh`.
///
/// Abandons the scrape on `shutdown` without touching the corpus.
pub async fn run_refresh(
    config: &Config,
    progress: ProgressMode,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let reporter = progress.reporter();

    let summary = tokio::select! {
        result = refresh_corpus(config, reporter.as_ref()) => result?,
        _ = shutdown => {
            tracing::warn!("refresh interrupted; corpus left unchanged");
            bail!("refresh interrupted");
        }
    };

    println!("refresh {}", summary.path.display());
    println!("  games: {}", summary.games);
    println!("  missing: {}", summary.missing);
    println!("  written: {}", summary.games + summary.missing);
    println!("  elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!("ok");

    Ok(())
}
