// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-source state machine: decay, burst detection, per-source
//! baselines, and cooldown-gated alert firing.

use crate::baseline::{push_bounded, threshold_from_series};
use crate::error::EngineError;
use hids_core::{AlertRecord, Clock, Severity, SrcId};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub const FAILED_LOGIN_SCORE: f64 = 2.0;
pub const REPEAT_PENALTY: f64 = 3.0;
pub const RAPID_ATTEMPT_BONUS: f64 = 5.0;
pub const RAPID_ATTEMPT_WINDOW: f64 = 5.0;
pub const SCORE_DECAY_PER_SECOND: f64 = 0.5;
pub const TIME_WINDOW: f64 = 60.0;
pub const BURST_WINDOW: f64 = 5.0;
pub const BURST_THRESHOLD: usize = 3;
pub const RISK_THRESHOLD: f64 = 10.0;
pub const ALERT_COOLDOWN: f64 = 30.0;
pub const IP_TTL: f64 = 600.0;
pub const MAX_TRACKED_IPS: usize = 10_000;

/// Sink the engine hands finished alert records to. Implemented by
/// `hids-adapters`; kept here as a trait object boundary so the engine
/// never needs to depend on adapters, and so the alert path can never
/// block on engine state (see SPEC_FULL.md §5).
pub trait AlertSink: Send + Sync {
    fn send_alert(&self, record: AlertRecord);
}

/// Contract the runtime depends on (SPEC_FULL.md §6, "Engine capability
/// contract"). `is_thread_safe` is a capability flag, not a runtime
/// toggle: the runtime reads it once at construction and wraps the
/// engine in a serializer if it answers `false` (see `crate::runtime`).
pub trait DetectionEngine: Send + Sync {
    fn process_failed_login(&self, src: &SrcId) -> Result<(), EngineError>;
    fn is_thread_safe(&self) -> bool;
}

#[derive(Debug, Clone)]
struct SourceState {
    attempts: VecDeque<f64>,
    score: f64,
    last_seen: f64,
    last_score_update: f64,
    baseline: VecDeque<f64>,
}

impl SourceState {
    fn new(now: f64) -> Self {
        Self {
            attempts: VecDeque::new(),
            score: 0.0,
            last_seen: now,
            last_score_update: now,
            baseline: VecDeque::new(),
        }
    }
}

#[derive(Default)]
struct EngineState {
    sources: HashMap<SrcId, SourceState>,
    cooldowns: HashMap<String, f64>,
}

impl EngineState {
    /// Fire-once-per-window-per-rule-per-source gate. Latches `now` on
    /// success; an unseen key behaves as `last_fired = 0.0` so the first
    /// check for any `(rule, src)` always passes.
    fn check_cooldown(&mut self, key: &str, now: f64) -> bool {
        let last_fired = self.cooldowns.get(key).copied().unwrap_or(0.0);
        if now - last_fired >= ALERT_COOLDOWN {
            self.cooldowns.insert(key.to_string(), now);
            true
        } else {
            false
        }
    }
}

enum PendingAlert {
    Baseline { failed_count: usize, threshold: f64 },
    Burst { recent: usize },
    Risk { score: f64 },
}

/// Reference detection engine: a single exclusive lock over all
/// per-source and cooldown state (the "exclusive-lock option" named in
/// SPEC_FULL.md §5, as opposed to declaring `is_thread_safe = false` and
/// relying on the runtime's external serializer).
pub struct Engine {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn AlertSink>,
    state: Mutex<EngineState>,
}

impl Engine {
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            clock,
            sink,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Evict TTL-expired sources, then if still over capacity evict the
    /// smallest-`last_seen` entries until the bound holds.
    fn evict(state: &mut EngineState, now: f64) {
        state
            .sources
            .retain(|_, s| now - s.last_seen <= IP_TTL);

        if state.sources.len() > MAX_TRACKED_IPS {
            let excess = state.sources.len() - MAX_TRACKED_IPS;
            let mut by_last_seen: Vec<(SrcId, f64)> = state
                .sources
                .iter()
                .map(|(id, s)| (id.clone(), s.last_seen))
                .collect();
            by_last_seen.sort_by(|a, b| a.1.total_cmp(&b.1));
            for (id, _) in by_last_seen.into_iter().take(excess) {
                state.sources.remove(&id);
            }
        }
    }

    fn emit(&self, rule: &str, message: String, metadata: serde_json::Value) {
        self.sink.send_alert(AlertRecord::new(
            "SECURITY",
            Severity::Warning,
            message,
            Some(metadata),
        ));
        tracing::warn!(target: "detection", rule, "alert fired");
    }
}

impl DetectionEngine for Engine {
    fn process_failed_login(&self, src: &SrcId) -> Result<(), EngineError> {
        let now = self.clock.now();
        let mut pending = Vec::new();

        {
            let mut state = self.state.lock();
            Self::evict(&mut state, now);

            let entry = state
                .sources
                .entry(src.clone())
                .or_insert_with(|| SourceState::new(now));

            entry.last_seen = now;

            let elapsed = now - entry.last_score_update;
            entry.score = (entry.score - elapsed * SCORE_DECAY_PER_SECOND).max(0.0);
            entry.last_score_update = now;

            entry
                .attempts
                .retain(|t| now - t < TIME_WINDOW);

            entry.score += FAILED_LOGIN_SCORE;
            if !entry.attempts.is_empty() {
                entry.score += REPEAT_PENALTY;
                if let Some(&last) = entry.attempts.back() {
                    if now - last < RAPID_ATTEMPT_WINDOW {
                        entry.score += RAPID_ATTEMPT_BONUS;
                    }
                }
            }
            entry.attempts.push_back(now);

            let failed_count = entry.attempts.len();
            push_bounded(&mut entry.baseline, failed_count as f64);
            let threshold = threshold_from_series(&entry.baseline);

            let recent_burst = entry
                .attempts
                .iter()
                .filter(|&&t| now - t <= BURST_WINDOW)
                .count();
            let score = entry.score;

            if failed_count as f64 > threshold
                && state.check_cooldown(&format!("baseline_{src}"), now)
            {
                pending.push(PendingAlert::Baseline {
                    failed_count,
                    threshold,
                });
            }
            if recent_burst >= BURST_THRESHOLD
                && state.check_cooldown(&format!("burst_{src}"), now)
            {
                pending.push(PendingAlert::Burst { recent: recent_burst });
            }
            if score >= RISK_THRESHOLD && state.check_cooldown(&format!("risk_{src}"), now) {
                pending.push(PendingAlert::Risk { score });
            }
        }

        for alert in pending {
            match alert {
                PendingAlert::Baseline {
                    failed_count,
                    threshold,
                } => self.emit(
                    "baseline",
                    format!(
                        "Behavioural anomaly detected for {src}: {failed_count} failures exceeds threshold {threshold:.2}"
                    ),
                    json!({"src": src.as_str(), "failed_count": failed_count, "threshold": threshold}),
                ),
                PendingAlert::Burst { recent } => self.emit(
                    "burst",
                    format!("Burst attack detected for {src}: {recent} attempts within {BURST_WINDOW}s"),
                    json!({"src": src.as_str(), "recent": recent}),
                ),
                PendingAlert::Risk { score } => self.emit(
                    "risk",
                    format!("High risk intrusion detected for {src}: score {score:.2}"),
                    json!({"src": src.as_str(), "score": score}),
                ),
            }
        }

        Ok(())
    }

    fn is_thread_safe(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
