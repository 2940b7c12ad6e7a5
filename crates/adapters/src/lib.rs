// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! External-collaborator adapters: the rotating alert sink, the log
//! tailer/extractor, and the event-to-alert mapping. These are the
//! concrete pieces that plug into `hids-engine`'s trait-object
//! boundaries (`AlertSink`) without the engine ever depending back on
//! this crate.

pub mod alert_sink;
pub mod error;
pub mod mapping;
pub mod tailer;

pub use alert_sink::{
    global_alert_sink, send_alert, setup_alert_system, trigger_alert, StructuredAlertSink,
};
pub use error::{AlertSinkError, MappingError, TailerError};
pub use mapping::map_event_to_alert;
pub use tailer::{collect_events, LogLineEvent, LogTailer};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use alert_sink::reset_alert_system;
