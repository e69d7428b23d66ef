// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log of job events.
//!
//! One JSON object per line: `{"seq":N,"event":{...}}`. Appends are buffered
//! in memory until [`Wal::flush`]; a failed flush discards the buffer and
//! cuts the file back to its previous length. A line that fails to parse
//! ends the valid log; on open the original file is backed up and rewritten
//! without the corrupt tail.

use crate::snapshot::rotate_bak_path;
use pin_core::JobEvent;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: JobEvent,
}

pub struct Wal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    /// Sequence of the last entry known to be on disk
    flushed_seq: u64,
    pending: Vec<u8>,
}

impl Wal {
    /// Open (or create) the log at `path`.
    ///
    /// `processed_seq` is the sequence already captured by a snapshot; new
    /// entries are numbered after whichever is larger, it or the last valid
    /// entry on disk.
    pub fn open(path: &Path, processed_seq: u64) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (entries, corrupt) = if path.exists() { read_entries(path)? } else { (vec![], false) };

        if corrupt {
            let bak = rotate_bak_path(path);
            tracing::warn!(
                path = %path.display(),
                backup = %bak.display(),
                valid_entries = entries.len(),
                "corrupt WAL detected, keeping valid prefix",
            );
            fs::copy(path, &bak)?;
            write_entries(path, &entries)?;
        }

        let last_seq = entries.last().map_or(0, |e| e.seq);
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let write_seq = last_seq.max(processed_seq);
        Ok(Self { path: path.to_path_buf(), file, write_seq, flushed_seq: write_seq, pending: Vec::new() })
    }

    /// Sequence number of the last appended entry.
    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    /// Buffer an event; returns its sequence number.
    pub fn append(&mut self, event: &JobEvent) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let entry = WalEntry { seq, event: event.clone() };
        let start = self.pending.len();
        if let Err(e) = serde_json::to_writer(&mut self.pending, &entry) {
            self.pending.truncate(start);
            return Err(e.into());
        }
        self.pending.push(b'\n');
        self.write_seq = seq;
        Ok(seq)
    }

    /// Write buffered entries and sync them to disk.
    ///
    /// On error every buffered entry is dropped and `write_seq` returns to
    /// the last flushed entry.
    pub fn flush(&mut self) -> Result<(), WalError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let result = self.write_pending();
        self.pending.clear();
        match result {
            Ok(()) => {
                self.flushed_seq = self.write_seq;
                Ok(())
            }
            Err(e) => {
                self.write_seq = self.flushed_seq;
                Err(e)
            }
        }
    }

    fn write_pending(&mut self) -> Result<(), WalError> {
        let len_before = self.file.metadata()?.len();
        if let Err(e) = self.file.write_all(&self.pending).and_then(|()| self.file.sync_data()) {
            // Drop a torn line so later entries stay readable
            if let Err(trunc) = self.file.set_len(len_before) {
                tracing::warn!(path = %self.path.display(), error = %trunc, "failed to cut back WAL");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Flushed entries with `seq > after`. Stops at the first corrupt line.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        let (entries, corrupt) = read_entries(&self.path)?;
        if corrupt {
            tracing::warn!(path = %self.path.display(), "WAL read stopped at corrupt entry");
        }
        Ok(entries.into_iter().filter(|e| e.seq > after).collect())
    }

    /// Drop flushed entries with `seq < keep_from`.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), WalError> {
        self.flush()?;
        let (entries, _) = read_entries(&self.path)?;
        let kept: Vec<WalEntry> = entries.into_iter().filter(|e| e.seq >= keep_from).collect();
        write_entries(&self.path, &kept)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        Ok(())
    }
}

/// Read entries up to the first unparseable line. The flag reports whether
/// such a line was found.
fn read_entries(path: &Path) -> Result<(Vec<WalEntry>, bool), WalError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(_) => return Ok((entries, true)),
        }
    }
    Ok((entries, false))
}

/// Atomically replace the file at `path` with `entries`.
fn write_entries(path: &Path, entries: &[WalEntry]) -> Result<(), WalError> {
    let tmp = path.with_extension("tmp");
    {
        let mut out = File::create(&tmp)?;
        for entry in entries {
            serde_json::to_writer(&mut out, entry)?;
            out.write_all(b"\n")?;
        }
        out.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
