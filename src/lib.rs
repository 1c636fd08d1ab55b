//! # jarchive
//!
//! Harvests game records from the J! Archive, normalizes each page into a
//! stable schema, persists the whole corpus as one JSON document, and
//! serves read-only queries over it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │   Fetcher   │──▶│    Retry    │──▶│  Extractor  │──▶│  Corpus  │
//! │  (reqwest)  │   │  (backoff)  │   │  (scraper)  │   │  (JSON)  │
//! └─────────────┘   └─────────────┘   └─────────────┘   └────┬─────┘
//!        ▲ bounded by the scheduler                          │
//!                                          ┌─────────────────┤
//!                                          ▼                 ▼
//!                                     ┌──────────┐     ┌──────────┐
//!                                     │   CLI    │     │   HTTP   │
//!                                     │(jarchive)│     │  (axum)  │
//!                                     └──────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! jarchive refresh --first-id 1 --last-id 100   # scrape into jeopardy_games.json
//! jarchive list --page 1 --size 10
//! jarchive date 2011-09-08
//! jarchive serve                                 # HTTP API + refresh every 24h
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Corpus record types and their wire format |
//! | [`fetch`] | Single-shot HTTP GET behind the [`fetch::Fetcher`] trait |
//! | [`retry`] | Exponential-backoff retry around a fetcher |
//! | [`extract`] | Game page → record extraction |
//! | [`scrape`] | Bounded-concurrency scraping of an id range |
//! | [`corpus`] | Sorting, atomic writing and loading of the corpus |
//! | [`refresh`] | One-shot and periodic refresh orchestration |
//! | [`query`] | Pagination, id and date lookups |
//! | [`server`] | HTTP query surface |
//! | [`progress`] | Refresh progress reporting |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod corpus;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod progress;
pub mod query;
pub mod refresh;
pub mod retry;
pub mod scrape;
pub mod server;

pub use refresh::{refresh_corpus, RefreshSummary};
