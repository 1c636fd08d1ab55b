//! Refresh progress reporting.
//!
//! Reports observable progress during `jarchive refresh` so users can see
//! how many game pages are done and when the corpus is being written.
//! Progress goes to **stderr** so stdout stays parseable for scripts.

use std::io::Write;
use std::path::PathBuf;

/// How often (in completed games) a scraping event is emitted.
pub const REPORT_EVERY: u64 = 100;

/// A single progress event for a refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScrapeProgressEvent {
    /// `done` of `total` game ids have produced an entry.
    Scraping { done: u64, total: u64 },
    /// The sorted corpus is being written.
    Writing { path: PathBuf, entries: u64 },
}

/// Reports refresh progress. Implementations write to stderr (human or JSON).
pub trait ScrapeProgressReporter: Send + Sync {
    fn report(&self, event: ScrapeProgressEvent);
}

/// Human-friendly progress on stderr: "refresh  scraping  1,200 / 9,999 games".
pub struct StderrProgress;

impl ScrapeProgressReporter for StderrProgress {
    fn report(&self, event: ScrapeProgressEvent) {
        let line = match &event {
            ScrapeProgressEvent::Scraping { done, total } => format!(
                "refresh  scraping  {} / {} games\n",
                format_number(*done),
                format_number(*total)
            ),
            ScrapeProgressEvent::Writing { path, entries } => format!(
                "refresh  writing  {} entries to {}\n",
                format_number(*entries),
                path.display()
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ScrapeProgressReporter for JsonProgress {
    fn report(&self, event: ScrapeProgressEvent) {
        let obj = match &event {
            ScrapeProgressEvent::Scraping { done, total } => serde_json::json!({
                "event": "progress",
                "phase": "scraping",
                "n": done,
                "total": total
            }),
            ScrapeProgressEvent::Writing { path, entries } => serde_json::json!({
                "event": "progress",
                "phase": "writing",
                "path": path.display().to_string(),
                "entries": entries
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ScrapeProgressReporter for NoProgress {
    fn report(&self, _event: ScrapeProgressEvent) {}
}

/// Whether the `done`-th completion out of `total` should be reported.
pub fn should_report(done: u64, total: u64) -> bool {
    done == total || done % REPORT_EVERY == 0
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ScrapeProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
