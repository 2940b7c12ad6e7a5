// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker heartbeat table. Deliberately wall-clock (`Instant`), not
//! the injected logical [`hids_core::Clock`] the engine uses for scoring
//! — see SPEC_FULL.md §9, "Heartbeats remain wall-clock, not logical".

use hids_core::WorkerId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub struct HeartbeatTable {
    beats: Mutex<HashMap<WorkerId, Instant>>,
}

impl HeartbeatTable {
    pub fn new() -> Self {
        Self {
            beats: Mutex::new(HashMap::new()),
        }
    }

    pub fn touch(&self, worker_id: &WorkerId) {
        self.beats.lock().insert(worker_id.clone(), Instant::now());
    }

    /// `true` if `worker_id` has never beaten or its last beat is older
    /// than `max_age`.
    pub fn is_stuck(&self, worker_id: &WorkerId, max_age: Duration) -> bool {
        match self.beats.lock().get(worker_id) {
            Some(last) => last.elapsed() > max_age,
            None => true,
        }
    }

    pub fn remove(&self, worker_id: &WorkerId) {
        self.beats.lock().remove(worker_id);
    }
}

impl Default for HeartbeatTable {
    fn default() -> Self {
        Self::new()
    }
}
