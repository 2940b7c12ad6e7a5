// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered runtime configuration (§10.2): built-in defaults, an optional
//! TOML file named by `HIDS_CONFIG`, then environment variable
//! overrides (`DEBUG_MODE`, `HIDS_LOG_DIR`).

use crate::error::ConfigError;
use hids_engine::runtime::DEFAULT_NUM_WORKERS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_TAILED_LOG_PATH: &str = "var/auth.log";
const DEFAULT_POLL_INTERVAL_SECS: f64 = 1.0;
const DEFAULT_RUNTIME_LOG_PATH: &str = "logs/runtime.log";
const DEFAULT_DETECTION_LOG_PATH: &str = "logs/detection.log";
const DEFAULT_ALERT_LOG_PATH: &str = "logs/alerts.log";
const STANDARD_ROTATION_MAX_BYTES: u64 = 2 * 1024 * 1024;
const STANDARD_ROTATION_BACKUPS: u32 = 3;
const ALERT_ROTATION_MAX_BYTES: u64 = 10 * 1024 * 1024;
const ALERT_ROTATION_BACKUPS: u32 = 5;

/// Rotation size+backup pair shared by all three on-disk logs (§6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub backup_count: u32,
}

/// The fully resolved runtime configuration a `hidsd` process starts
/// with. Every field here has a built-in default; only deviations need
/// to appear in an `HIDS_CONFIG` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tailed_log_path: PathBuf,
    pub poll_interval_secs: f64,
    pub num_workers: usize,
    pub backpressure_policy: hids_engine::BackpressurePolicy,
    pub runtime_log_path: PathBuf,
    pub runtime_log_rotation: RotationPolicy,
    pub detection_log_path: PathBuf,
    pub detection_log_rotation: RotationPolicy,
    pub alert_log_path: PathBuf,
    pub alert_log_rotation: RotationPolicy,
    pub debug_mode: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tailed_log_path: PathBuf::from(DEFAULT_TAILED_LOG_PATH),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            num_workers: DEFAULT_NUM_WORKERS,
            backpressure_policy: hids_engine::BackpressurePolicy::default(),
            runtime_log_path: PathBuf::from(DEFAULT_RUNTIME_LOG_PATH),
            runtime_log_rotation: RotationPolicy {
                max_bytes: STANDARD_ROTATION_MAX_BYTES,
                backup_count: STANDARD_ROTATION_BACKUPS,
            },
            detection_log_path: PathBuf::from(DEFAULT_DETECTION_LOG_PATH),
            detection_log_rotation: RotationPolicy {
                max_bytes: STANDARD_ROTATION_MAX_BYTES,
                backup_count: STANDARD_ROTATION_BACKUPS,
            },
            alert_log_path: PathBuf::from(DEFAULT_ALERT_LOG_PATH),
            alert_log_rotation: RotationPolicy {
                max_bytes: ALERT_ROTATION_MAX_BYTES,
                backup_count: ALERT_ROTATION_BACKUPS,
            },
            debug_mode: true,
        }
    }
}

impl RuntimeConfig {
    /// Load with the precedence named in SPEC_FULL.md §10.2: defaults,
    /// then an optional `HIDS_CONFIG` TOML file (a missing file is not
    /// an error), then `DEBUG_MODE`/`HIDS_LOG_DIR` env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("HIDS_CONFIG") {
            config = config.merge_toml_file(Path::new(&path))?;
        }

        if let Ok(debug) = std::env::var("DEBUG_MODE") {
            config.debug_mode = debug.eq_ignore_ascii_case("true");
        }

        if let Ok(log_dir) = std::env::var("HIDS_LOG_DIR") {
            let log_dir = PathBuf::from(log_dir);
            config.runtime_log_path = log_dir.join("runtime.log");
            config.detection_log_path = log_dir.join("detection.log");
            config.alert_log_path = log_dir.join("alerts.log");
        }

        Ok(config)
    }

    fn merge_toml_file(self, path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(self),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let overrides: PartialRuntimeConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(overrides.apply_over(self))
    }
}

/// Every field optional, so a TOML file only needs to name what it
/// wants to override; absent keys keep the already-resolved default.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialRuntimeConfig {
    tailed_log_path: Option<PathBuf>,
    poll_interval_secs: Option<f64>,
    num_workers: Option<usize>,
    backpressure_policy: Option<hids_engine::BackpressurePolicy>,
    runtime_log_path: Option<PathBuf>,
    runtime_log_rotation: Option<RotationPolicy>,
    detection_log_path: Option<PathBuf>,
    detection_log_rotation: Option<RotationPolicy>,
    alert_log_path: Option<PathBuf>,
    alert_log_rotation: Option<RotationPolicy>,
    debug_mode: Option<bool>,
}

impl PartialRuntimeConfig {
    fn apply_over(self, mut base: RuntimeConfig) -> RuntimeConfig {
        if let Some(v) = self.tailed_log_path {
            base.tailed_log_path = v;
        }
        if let Some(v) = self.poll_interval_secs {
            base.poll_interval_secs = v;
        }
        if let Some(v) = self.num_workers {
            base.num_workers = v;
        }
        if let Some(v) = self.backpressure_policy {
            base.backpressure_policy = v;
        }
        if let Some(v) = self.runtime_log_path {
            base.runtime_log_path = v;
        }
        if let Some(v) = self.runtime_log_rotation {
            base.runtime_log_rotation = v;
        }
        if let Some(v) = self.detection_log_path {
            base.detection_log_path = v;
        }
        if let Some(v) = self.detection_log_rotation {
            base.detection_log_rotation = v;
        }
        if let Some(v) = self.alert_log_path {
            base.alert_log_path = v;
        }
        if let Some(v) = self.alert_log_rotation {
            base.alert_log_rotation = v;
        }
        if let Some(v) = self.debug_mode {
            base.debug_mode = v;
        }
        base
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
