//! # jarchive CLI
//!
//! The `jarchive` binary scrapes the archive into a corpus file and
//! answers queries over it, either directly or through the HTTP server.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `jarchive refresh` | Scrape the configured id range and rewrite the corpus |
//! | `jarchive serve` | Start the HTTP query server with periodic refresh |
//! | `jarchive list` | Print one page of corpus game ids |
//! | `jarchive get <id>` | Print the game whose title ends with `<id>` |
//! | `jarchive date <prefix>` | Print games whose date starts with `<prefix>` |
//!
//! ## Examples
//!
//! ```bash
//! # Scrape a small range with progress on stderr
//! jarchive refresh --first-id 6000 --last-id 6100 --progress human
//!
//! # Serve an existing corpus without scraping
//! PORT=8080 jarchive serve --no-refresh
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use jarchive::config::{self, Config};
use jarchive::progress::ProgressMode;
use jarchive::{logging, query, refresh, server};

/// jarchive: scrape the J! Archive into a JSON corpus and query it.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(name = "jarchive", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/jarchive.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Scrape every configured game id and atomically rewrite the corpus.
    ///
    /// Flags override the matching `[scrape]` / `[corpus]` settings for this run.
    Refresh {
        /// First game id to scrape (inclusive).
        #[arg(long)]
        first_id: Option<u32>,

        /// Last game id to scrape (inclusive).
        #[arg(long)]
        last_id: Option<u32>,

        /// Maximum number of game pages fetched at once.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Attempts per game before it is recorded as missing.
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Corpus file to write.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Progress output on stderr. Defaults to `human` on a terminal, else `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Start the HTTP query server.
    ///
    /// Refreshes the corpus at startup and then every
    /// `schedule.interval_hours`, unless `--no-refresh` is given.
    Serve {
        /// Serve the existing corpus only; never scrape.
        #[arg(long)]
        no_refresh: bool,
    },

    /// Print one page of corpus game ids as JSON.
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = 10)]
        size: usize,
    },

    /// Print the first game whose title ends with `id`.
    Get { id: u32 },

    /// Print all games whose date starts with `prefix` (e.g. `2011-09-08`).
    Date { prefix: String },
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Refresh {
            first_id,
            last_id,
            concurrency,
            max_attempts,
            output,
            progress,
        } => {
            apply_refresh_overrides(&mut cfg, first_id, last_id, concurrency, max_attempts, output);
            config::validate(&cfg)?;
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            refresh::run_refresh(&cfg, progress, shutdown_signal()).await?;
        }
        Commands::Serve { no_refresh } => {
            let refresher = if no_refresh {
                None
            } else {
                Some(tokio::spawn(refresh::run_periodic(cfg.clone())))
            };
            let result = server::run_server(&cfg, shutdown_signal()).await;
            if let Some(handle) = refresher {
                // Dropping an in-progress refresh leaves the last complete corpus in place.
                handle.abort();
            }
            result?;
        }
        Commands::List { page, size } => {
            query::run_list(&cfg, page, size)?;
        }
        Commands::Get { id } => {
            query::run_get(&cfg, id)?;
        }
        Commands::Date { prefix } => {
            query::run_date(&cfg, &prefix)?;
        }
    }

    Ok(())
}

fn apply_refresh_overrides(
    cfg: &mut Config,
    first_id: Option<u32>,
    last_id: Option<u32>,
    concurrency: Option<usize>,
    max_attempts: Option<u32>,
    output: Option<PathBuf>,
) {
    if let Some(v) = first_id {
        cfg.scrape.first_id = v;
    }
    if let Some(v) = last_id {
        cfg.scrape.last_id = v;
    }
    if let Some(v) = concurrency {
        cfg.scrape.concurrency = v;
    }
    if let Some(v) = max_attempts {
        cfg.scrape.max_attempts = v;
    }
    if let Some(v) = output {
        cfg.corpus.path = v;
    }
}
