// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The thin composition root (§10.3): layered configuration, the
//! `tracing` logging bootstrap, and the `hidsd` binary that wires
//! `hids-core`/`hids-engine`/`hids-adapters` into a running process.
//!
//! Nothing here implements detection policy. It loads config, stands
//! up logging and the alert sink, obtains the `RuntimeManager`
//! singleton, starts the tailer, and waits for a termination signal.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{RotationPolicy, RuntimeConfig};
pub use error::{ConfigError, StartupError};
pub use logging::{setup_logging, LoggingGuard};
