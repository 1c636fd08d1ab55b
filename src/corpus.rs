//! Corpus materialization and loading.
//!
//! The corpus is one JSON array, pretty-printed with 4-space indentation,
//! newest game first. It is replaced atomically: the new document is
//! written to a temporary file in the same directory and renamed over the
//! old one, so a concurrent reader sees either the previous corpus or the
//! new one, never a mix.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::CorpusEntry;

/// Sort key, compared descending.
///
/// Dated games sort by date with tiebreak `0`; everything else sorts as
/// the minimum date with its id as tiebreak, which puts undated entries
/// after all dated ones, highest id first.
pub fn sort_key(entry: &CorpusEntry) -> (NaiveDate, u32) {
    match entry.game_date() {
        Some(date) => (date, 0),
        None => (NaiveDate::MIN, entry.game_id()),
    }
}

/// Order for the corpus: descending [`sort_key`], equal keys by ascending id
/// so the output does not depend on scrape completion order.
pub fn corpus_order(a: &CorpusEntry, b: &CorpusEntry) -> Ordering {
    sort_key(b)
        .cmp(&sort_key(a))
        .then_with(|| a.game_id().cmp(&b.game_id()))
}

pub fn sort_entries(entries: &mut [CorpusEntry]) {
    entries.sort_by(corpus_order);
}

/// Sort `entries` and atomically replace the corpus at `path` with them.
///
/// Returns the sorted entries. On error the previous file is untouched.
pub fn materialize(mut entries: Vec<CorpusEntry>, path: &Path) -> Result<Vec<CorpusEntry>> {
    sort_entries(&mut entries);
    write_corpus(&entries, path)?;
    Ok(entries)
}

/// Write `entries` as-is to `path` via a temporary sibling file and rename.
pub fn write_corpus(entries: &[CorpusEntry], path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create corpus directory: {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        entries
            .serialize(&mut serializer)
            .context("Failed to serialize corpus")?;
        writer.flush().context("Failed to write corpus")?;
    }
    tmp.as_file()
        .sync_all()
        .context("Failed to sync corpus to disk")?;

    // Temporary files are created owner-only; the corpus is meant to be shared.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .context("Failed to set corpus permissions")?;
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace corpus file: {}", path.display()))?;

    Ok(())
}

pub fn parse_corpus(bytes: &[u8]) -> Result<Vec<CorpusEntry>> {
    serde_json::from_slice(bytes).context("Failed to parse corpus JSON")
}

pub fn load_corpus(path: &Path) -> Result<Vec<CorpusEntry>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    parse_corpus(&bytes)
}
