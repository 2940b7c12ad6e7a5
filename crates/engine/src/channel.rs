// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-by-policy event queue. Backed by an unbounded `tokio::mpsc`
//! channel plus an explicit advisory depth counter, since the backpressure
//! policies in SPEC_FULL.md §4.7 need to observe and react to queue depth
//! themselves rather than rely on a bounded channel's own blocking.

use hids_core::SrcId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, timeout};

pub const BACKPRESSURE_THRESHOLD: usize = 1000;
const DELAY_MAX_WAIT: Duration = Duration::from_secs(5);
const DELAY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What `submit` does once `qsize() > BACKPRESSURE_THRESHOLD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Discard the new item, log a warning, report failure to the caller.
    Drop,
    /// Block the producer for up to 5s waiting for drainage, then drop.
    Delay,
    /// Log a warning but still enqueue.
    #[default]
    Warn,
}

/// A bounded-by-policy FIFO of [`SrcId`] events.
pub struct EventChannel {
    tx: mpsc::UnboundedSender<SrcId>,
    rx: Mutex<mpsc::UnboundedReceiver<SrcId>>,
    qsize: AtomicUsize,
    policy: BackpressurePolicy,
}

impl EventChannel {
    pub fn new(policy: BackpressurePolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            qsize: AtomicUsize::new(0),
            policy,
        }
    }

    /// Advisory queue depth; may be stale by the time the caller reads it.
    pub fn qsize(&self) -> usize {
        self.qsize.load(Ordering::SeqCst)
    }

    /// The configured backpressure policy.
    pub fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    /// Enqueue `src`, applying the configured backpressure policy.
    /// Returns `false` when the item was dropped.
    pub async fn submit(&self, src: SrcId) -> bool {
        if self.qsize() > BACKPRESSURE_THRESHOLD {
            match self.policy {
                BackpressurePolicy::Drop => {
                    tracing::warn!(target: "runtime", src = %src, "dropping event over backpressure threshold");
                    return false;
                }
                BackpressurePolicy::Delay => {
                    let deadline = tokio::time::Instant::now() + DELAY_MAX_WAIT;
                    loop {
                        if self.qsize() <= BACKPRESSURE_THRESHOLD {
                            break;
                        }
                        if tokio::time::Instant::now() >= deadline {
                            tracing::warn!(target: "runtime", src = %src, "dropping event after delay wait");
                            return false;
                        }
                        sleep(DELAY_POLL_INTERVAL).await;
                    }
                }
                BackpressurePolicy::Warn => {
                    tracing::warn!(target: "runtime", src = %src, "enqueueing over backpressure threshold");
                }
            }
        }

        if self.tx.send(src).is_err() {
            return false;
        }
        self.qsize.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Dequeue with a timeout; `None` on empty/timeout, never an error.
    pub async fn recv_timeout(&self, wait: Duration) -> Option<SrcId> {
        let mut rx = self.rx.lock().await;
        match timeout(wait, rx.recv()).await {
            Ok(Some(item)) => {
                self.qsize.fetch_sub(1, Ordering::SeqCst);
                Some(item)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
