// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level errors: configuration loading and startup.

use hids_core::FatalClassify;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl FatalClassify for ConfigError {
    // Malformed config represents operator misconfiguration, not a
    // transient runtime condition; it is surfaced, never silently
    // defaulted (SPEC_FULL.md §10.2).
    fn is_fatal(&self) -> bool {
        true
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create log directory {path}: {source}")]
    LogDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open alert sink: {0}")]
    AlertSink(#[from] hids_adapters::AlertSinkError),
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
    #[error("runtime error: {0}")]
    Runtime(#[from] hids_engine::RuntimeError),
}

impl FatalClassify for StartupError {
    fn is_fatal(&self) -> bool {
        true
    }
}
