// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The structured alert sink (§4.2): a process-wide, lazily-initialized
//! rotating file writer behind a single mutex, plus the free-standing
//! `setup_alert_system`/`send_alert`/`trigger_alert` entry points a
//! caller can reach for without constructing one explicitly.
//!
//! Implements `hids_engine::engine::AlertSink` so the detection engine
//! can hand it finished [`AlertRecord`]s without either crate depending
//! on the other's concrete types beyond that one trait.

use crate::error::AlertSinkError;
use hids_core::{AlertRecord, Severity};
use hids_engine::engine::AlertSink;
use parking_lot::Mutex;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub const DEFAULT_ALERT_LOG_PATH: &str = "logs/alerts.log";
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_BACKUP_COUNT: u32 = 5;

fn severity_rank(s: Severity) -> u8 {
    match s {
        Severity::Info => 0,
        Severity::Warning => 1,
        Severity::Error => 2,
        Severity::Critical => 3,
    }
}

enum Target {
    File {
        path: PathBuf,
        max_bytes: u64,
        backup_count: u32,
    },
    /// Fallback used when the on-disk target could not be opened at
    /// auto-init time (see the "cyclic risks" design note: the sink's
    /// own failures must never themselves become a reason to crash).
    Stderr,
}

/// Singleton-friendly rotating alert writer. Every write goes through
/// `state`, so concurrent callers always produce well-formed lines.
pub struct StructuredAlertSink {
    target: Mutex<Target>,
    min_level: Severity,
}

impl StructuredAlertSink {
    /// Open (creating if absent) a rotating sink at `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        max_bytes: u64,
        backup_count: u32,
        min_level: Severity,
    ) -> Result<Self, AlertSinkError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| AlertSinkError::Open {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }
        // Touch the file so a misconfigured path fails fast at setup
        // time rather than on the first alert.
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AlertSinkError::Open {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            target: Mutex::new(Target::File {
                path,
                max_bytes,
                backup_count,
            }),
            min_level,
        })
    }

    pub fn default_sink() -> Result<Self, AlertSinkError> {
        Self::new(
            DEFAULT_ALERT_LOG_PATH,
            DEFAULT_MAX_BYTES,
            DEFAULT_BACKUP_COUNT,
            Severity::Info,
        )
    }

    fn stderr_only() -> Self {
        Self {
            target: Mutex::new(Target::Stderr),
            min_level: Severity::Info,
        }
    }

    /// Format and append `record`, rotating first if the target file is
    /// already at or past its size threshold.
    fn write_record(&self, record: &AlertRecord) -> Result<(), AlertSinkError> {
        if severity_rank(record.severity) < severity_rank(self.min_level) {
            return Ok(());
        }
        let line = record.to_line();
        let target = self.target.lock();
        match &*target {
            Target::Stderr => {
                eprintln!("{line}");
                Ok(())
            }
            Target::File {
                path,
                max_bytes,
                backup_count,
            } => {
                if let Ok(meta) = fs::metadata(path) {
                    if meta.len() >= *max_bytes {
                        rotate(path, *backup_count).map_err(AlertSinkError::Rotate)?;
                    }
                }
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| AlertSinkError::Open {
                        path: path.display().to_string(),
                        source,
                    })?;
                writeln!(file, "{line}").map_err(AlertSinkError::Write)
            }
        }
    }

    /// `send_alert(message, event_type, severity, metadata, with_stack)`
    /// from SPEC_FULL.md §4.2. `with_stack` appends the current backtrace
    /// as a block separated from `message` by a newline.
    pub fn send(
        &self,
        message: impl Into<String>,
        event_type: impl Into<String>,
        severity: Severity,
        metadata: Option<Value>,
        with_stack: bool,
    ) -> Result<(), AlertSinkError> {
        let mut message = message.into();
        if with_stack {
            message.push('\n');
            message.push_str(&std::backtrace::Backtrace::force_capture().to_string());
        }
        let record = AlertRecord::new(event_type, severity, message, metadata);
        self.write_record(&record)
    }

    /// Convenience: `SECURITY/WARNING` with no metadata or stack.
    pub fn trigger(&self, message: impl Into<String>) -> Result<(), AlertSinkError> {
        self.send(message, "SECURITY", Severity::Warning, None, false)
    }
}

impl AlertSink for StructuredAlertSink {
    fn send_alert(&self, record: AlertRecord) {
        // The engine->sink call path must never itself raise (see the
        // "cyclic risks" design note); fall back to stderr on failure.
        if let Err(err) = self.write_record(&record) {
            eprintln!("alert sink write failed, falling back to stderr: {err}");
            eprintln!("{}", record.to_line());
        }
    }
}

/// Shift `path.N` -> `path.N+1` up to `backup_count`, dropping the
/// oldest, then move `path` itself to `path.1`. `backup_count == 0`
/// truncates in place instead of keeping any history.
fn rotate(path: &Path, backup_count: u32) -> std::io::Result<()> {
    if backup_count == 0 {
        File::create(path)?;
        return Ok(());
    }
    let path_str = path.display().to_string();
    let oldest = format!("{path_str}.{backup_count}");
    let _ = fs::remove_file(&oldest);
    for i in (1..backup_count).rev() {
        let from = format!("{path_str}.{i}");
        let to = format!("{path_str}.{}", i + 1);
        let _ = fs::rename(&from, &to);
    }
    fs::rename(path, format!("{path_str}.1"))
}

fn slot() -> &'static Mutex<Option<Arc<StructuredAlertSink>>> {
    static SLOT: OnceLock<Mutex<Option<Arc<StructuredAlertSink>>>> = OnceLock::new();
    SLOT.get_or_init(|| Mutex::new(None))
}

/// Explicitly (re)configure the global alert sink.
pub fn setup_alert_system(
    path: impl Into<PathBuf>,
    max_bytes: u64,
    backup_count: u32,
    min_level: Severity,
) -> Result<Arc<StructuredAlertSink>, AlertSinkError> {
    let sink = Arc::new(StructuredAlertSink::new(
        path,
        max_bytes,
        backup_count,
        min_level,
    )?);
    *slot().lock() = Some(Arc::clone(&sink));
    Ok(sink)
}

/// The global sink, auto-initializing with defaults on first use.
pub fn global_alert_sink() -> Arc<StructuredAlertSink> {
    let mut guard = slot().lock();
    if let Some(sink) = guard.as_ref() {
        return Arc::clone(sink);
    }
    let sink = Arc::new(StructuredAlertSink::default_sink().unwrap_or_else(|err| {
        eprintln!("alert sink auto-init failed, falling back to stderr: {err}");
        StructuredAlertSink::stderr_only()
    }));
    *guard = Some(Arc::clone(&sink));
    sink
}

pub fn send_alert(
    message: impl Into<String>,
    event_type: impl Into<String>,
    severity: Severity,
    metadata: Option<Value>,
    with_stack: bool,
) {
    if let Err(err) = global_alert_sink().send(message, event_type, severity, metadata, with_stack)
    {
        eprintln!("send_alert failed: {err}");
    }
}

pub fn trigger_alert(message: impl Into<String>) {
    if let Err(err) = global_alert_sink().trigger(message) {
        eprintln!("trigger_alert failed: {err}");
    }
}

/// Forget the global sink. Test-only: production code initializes once
/// per process lifetime and never needs to forget it.
#[cfg(any(test, feature = "test-support"))]
pub fn reset_alert_system() {
    *slot().lock() = None;
}

#[cfg(test)]
#[path = "alert_sink_tests.rs"]
mod tests;
