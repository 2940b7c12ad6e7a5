// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The log tailer and extractor (§4.6): follows a file from EOF,
//! recognizes authentication-failure lines, extracts the offending IPv4,
//! and enqueues it onto the event channel, deduplicating near-duplicates.
//!
//! Also hosts [`collect_events`], a standalone helper unrelated to the
//! live tail loop: it snapshots the last few lines of a file as
//! `log_line` records for ad-hoc inspection.

use crate::error::TailerError;
use hids_core::SrcId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Sliding-window dedup TTL (§4.6).
pub const CACHE_TTL: Duration = Duration::from_secs(2);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

fn failure_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)failed|failure|invalid password|authentication error|login failed|authentication rejected")
            .expect("static failure-keyword pattern is valid")
    })
}

fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{1,3}\.){3}\d{1,3}").expect("static IPv4 pattern is valid")
    })
}

/// Extract the first dotted-quad IPv4 address from a line that already
/// matched the failure-keyword pattern. Returns `None` if no address is
/// present, in which case the line is dropped without being enqueued.
fn extract_ip(line: &str) -> Option<&str> {
    ipv4_pattern().find(line).map(|m| m.as_str())
}

/// A 2-second sliding cache over `"{ip}:{raw_line}"`, evicted lazily on
/// each lookup rather than on a background timer.
struct DedupCache {
    seen: HashMap<String, std::time::Instant>,
}

impl DedupCache {
    fn new() -> Self {
        Self {
            seen: HashMap::new(),
        }
    }

    /// Returns `true` if `key` was already seen within [`CACHE_TTL`],
    /// recording it as seen either way.
    fn is_duplicate(&mut self, key: String) -> bool {
        let now = std::time::Instant::now();
        self.seen
            .retain(|_, seen_at| now.duration_since(*seen_at) < CACHE_TTL);
        let duplicate = self.seen.contains_key(&key);
        self.seen.insert(key, now);
        duplicate
    }
}

/// Follows `path` from EOF, recognizing authentication-failure lines and
/// forwarding the extracted source IP to a sink closure. Tolerant of
/// truncation/rotation only insofar as re-reading from the current
/// offset on the next tick is acceptable (§9 design note); it does not
/// detect or specially handle either.
pub struct LogTailer {
    path: PathBuf,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl LogTailer {
    pub fn new(path: impl Into<PathBuf>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the tail loop, calling `on_event(SrcId)` for each non-duplicate
    /// failure line with a recognizable source IP. Returns once the
    /// shutdown flag is observed.
    pub async fn run<F>(self, mut on_event: F) -> Result<(), TailerError>
    where
        F: FnMut(SrcId),
    {
        let mut file = open_or_create(&self.path)?;
        file.seek(SeekFrom::End(0))
            .map_err(TailerError::Read)?;
        let mut reader = BufReader::new(file);
        let mut dedup = DedupCache::new();
        let mut line = String::new();

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Ok(());
            }

            line.clear();
            let bytes_read = reader.read_line(&mut line).map_err(TailerError::Read)?;
            if bytes_read == 0 {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() || !failure_pattern().is_match(trimmed) {
                continue;
            }
            let Some(ip) = extract_ip(trimmed) else {
                continue;
            };
            let key = format!("{ip}:{trimmed}");
            if dedup.is_duplicate(key) {
                continue;
            }
            on_event(SrcId::new(ip));
        }
    }
}

fn open_or_create(path: &Path) -> Result<File, TailerError> {
    std::fs::OpenOptions::new()
        .read(true)
        .create(true)
        .write(true)
        .open(path)
        .map_err(|source| TailerError::Open {
            path: path.display().to_string(),
            source,
        })
}

/// A line snapshot returned by [`collect_events`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogLineEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: String,
    pub timestamp: String,
}

/// Returns at most `limit` of the **last** trimmed non-empty lines of
/// `path` as `log_line` records. `limit <= 0` and a missing file both
/// return an empty sequence without error.
pub fn collect_events(limit: i64, path: impl AsRef<Path>) -> Vec<LogLineEvent> {
    if limit <= 0 {
        return Vec::new();
    }
    let path = path.as_ref();
    let Ok(mut file) = File::open(path) else {
        return Vec::new();
    };
    let mut contents = String::new();
    if file.read_to_string(&mut contents).is_err() {
        return Vec::new();
    }

    let lines: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(limit as usize);
    let timestamp = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();
    lines[start..]
        .iter()
        .map(|line| LogLineEvent {
            event_type: "log_line".to_string(),
            message: (*line).to_string(),
            timestamp: timestamp.clone(),
        })
        .collect()
}

#[cfg(test)]
#[path = "tailer_tests.rs"]
mod tests;
