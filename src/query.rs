//! Read-only queries over a materialized corpus.
//!
//! Shared by the HTTP surface and the `list`/`get`/`date` commands. All
//! functions take the corpus as a slice and never touch the network.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::Config;
use crate::corpus::load_corpus;
use crate::models::{CorpusEntry, GameRecord};

/// One page of corpus game ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GamePage {
    pub page: usize,
    pub size: usize,
    pub total_games: usize,
    pub total_pages: usize,
    pub games: Vec<u32>,
}

/// Page `page` (1-based) of `size` ids, in corpus order.
pub fn paginate(entries: &[CorpusEntry], page: usize, size: usize) -> Result<GamePage> {
    if page < 1 {
        bail!("invalid page: must be >= 1");
    }
    if size < 1 {
        bail!("invalid size: must be >= 1");
    }

    let total_games = entries.len();
    let games = entries
        .iter()
        .skip((page - 1).saturating_mul(size))
        .take(size)
        .map(|e| e.game_id())
        .collect();

    Ok(GamePage {
        page,
        size,
        total_games,
        total_pages: total_games.div_ceil(size),
        games,
    })
}

/// First game whose title ends with the decimal `id`.
///
/// This matches on the title text, not on `game_id`. Upstream titles end
/// with the air year, so in practice `2011` finds a game aired in 2011.
/// Missing entries are never returned.
pub fn find_by_title_suffix(entries: &[CorpusEntry], id: u32) -> Option<&GameRecord> {
    let suffix = id.to_string();
    entries
        .iter()
        .filter_map(CorpusEntry::as_game)
        .find(|g| g.game_title.ends_with(&suffix))
}

/// Every game whose corpus date string starts with `prefix`
/// (`"2011-09-08"`, `"2011-09"`, `"2011"` all work).
pub fn find_by_date_prefix<'a>(entries: &'a [CorpusEntry], prefix: &str) -> Vec<&'a GameRecord> {
    entries
        .iter()
        .filter_map(CorpusEntry::as_game)
        .filter(|g| {
            g.game_date_iso()
                .is_some_and(|date| date.starts_with(prefix))
        })
        .collect()
}

/// CLI entry point for `jarchive list`.
pub fn run_list(config: &Config, page: usize, size: usize) -> Result<()> {
    let entries = load_corpus(&config.corpus.path)?;
    let page = paginate(&entries, page, size)?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

/// CLI entry point for `jarchive get`. Exits with status 1 when nothing matches.
pub fn run_get(config: &Config, id: u32) -> Result<()> {
    let entries = load_corpus(&config.corpus.path)?;
    match find_by_title_suffix(&entries, id) {
        Some(game) => println!("{}", serde_json::to_string_pretty(game)?),
        None => {
            eprintln!("Error: Game {} not found", id);
            std::process::exit(1);
        }
    }
    Ok(())
}

/// CLI entry point for `jarchive date`. Exits with status 1 when nothing matches.
pub fn run_date(config: &Config, prefix: &str) -> Result<()> {
    let entries = load_corpus(&config.corpus.path)?;
    let games = find_by_date_prefix(&entries, prefix);
    if games.is_empty() {
        eprintln!("Error: No games found for date {}", prefix);
        std::process::exit(1);
    }
    println!("{}", serde_json::to_string_pretty(&games)?);
    Ok(())
}
