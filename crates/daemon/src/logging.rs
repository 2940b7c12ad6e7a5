// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging bootstrap (§10.1): two rotating `tracing` targets
//! (`runtime.log`, `detection.log`) split by event target, plus a
//! stdout layer for console visibility. The alert sink (§4.2) is not
//! part of this stack — it is its own rotating writer with its own
//! size+backup-count policy, since its exact on-disk textual form is
//! part of the observable contract rather than a `tracing` concern.

use crate::config::RotationPolicy;
use crate::error::StartupError;
use std::path::Path;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Target name the detection engine and worker loop tag their
/// diagnostics with (see `hids_engine::engine`/`hids_engine::worker`).
const DETECTION_TARGET: &str = "detection";
/// Target name the runtime, supervisor, channel, and safe-call wrapper
/// tag their diagnostics with.
const RUNTIME_TARGET: &str = "runtime";

/// Holds the non-blocking writer guards for the lifetime of the
/// process; dropping either one stops flushing its file.
pub struct LoggingGuard {
    _runtime: tracing_appender::non_blocking::WorkerGuard,
    _detection: tracing_appender::non_blocking::WorkerGuard,
}

/// Install the global `tracing` subscriber described in SPEC_FULL.md
/// §10.1. Idempotent within a process only in the sense that `tracing`
/// itself enforces (a second call panics, per `tracing`'s own global
/// default); `hidsd` only ever calls this once, from `main`.
pub fn setup_logging(config: &crate::RuntimeConfig) -> Result<LoggingGuard, StartupError> {
    rotate_if_needed(&config.runtime_log_path, &config.runtime_log_rotation);
    rotate_if_needed(&config.detection_log_path, &config.detection_log_rotation);

    let (runtime_writer, runtime_guard) = rolling_writer(&config.runtime_log_path)?;
    let (detection_writer, detection_guard) = rolling_writer(&config.detection_log_path)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if config.debug_mode { "debug" } else { "info" })
    });

    let runtime_layer = fmt::layer()
        .with_writer(runtime_writer)
        .with_filter(filter_fn(|meta| meta.target() == RUNTIME_TARGET));
    let detection_layer = fmt::layer()
        .with_writer(detection_writer)
        .with_filter(filter_fn(|meta| meta.target() == DETECTION_TARGET));
    // Console sees every runtime/detection diagnostic (never alerts,
    // which are sink-only per §7 and never routed through `tracing`).
    let stdout_layer = fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(runtime_layer)
        .with(detection_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _runtime: runtime_guard,
        _detection: detection_guard,
    })
}

fn rolling_writer(
    path: &Path,
) -> Result<
    (
        tracing_appender::non_blocking::NonBlocking,
        tracing_appender::non_blocking::WorkerGuard,
    ),
    StartupError,
> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).map_err(|source| StartupError::LogDir {
            path: dir.display().to_string(),
            source,
        })?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let appender = tracing_appender::rolling::never(dir.unwrap_or_else(|| Path::new(".")), file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// Size-based rotation at startup, mirroring the on-disk contract in
/// §6/§10.2: `tracing-appender`'s own rollers are time-based, so the
/// size+backup-count policy is enforced here instead, the same way the
/// alert sink enforces it at write time. Best-effort: rotation failures
/// are silently ignored so the daemon still starts.
fn rotate_if_needed(path: &Path, policy: &RotationPolicy) {
    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return,
    };
    if size < policy.max_bytes {
        return;
    }
    if policy.backup_count == 0 {
        let _ = std::fs::File::create(path);
        return;
    }
    let path_str = path.display().to_string();
    let oldest = format!("{path_str}.{}", policy.backup_count);
    let _ = std::fs::remove_file(&oldest);
    for i in (1..policy.backup_count).rev() {
        let from = format!("{path_str}.{i}");
        let to = format!("{path_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(path, format!("{path_str}.1"));
}
