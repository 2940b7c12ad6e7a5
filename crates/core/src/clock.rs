// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injected clock abstraction.
//!
//! The detection engine's decay, TTL, burst, and cooldown arithmetic is
//! defined entirely in terms of a monotonic `now()` read at the start of
//! each call. Tests drive that clock explicitly with [`FakeClock`] instead
//! of sleeping on the wall clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A source of monotonically non-decreasing time, in fractional seconds.
pub trait Clock: Send + Sync {
    /// Current time, in seconds, relative to some fixed but arbitrary origin.
    fn now(&self) -> f64;
}

/// Wall-clock implementation backed by [`Instant`].
#[derive(Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Deterministic clock for tests: starts at `0.0`, advances only when told.
///
/// Stores time as bit-pattern `u64` in an `AtomicU64` so `now()`/`advance()`
/// don't need a lock; the f64<->u64 bit conversion is lossless and ordering
/// on the bit pattern matches ordering on the float for all non-NaN values
/// this clock ever holds (it never goes negative or NaN).
#[derive(Clone)]
pub struct FakeClock {
    bits: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(0f64.to_bits())),
        }
    }

    pub fn at(t: f64) -> Self {
        let clock = Self::new();
        clock.set(t);
        clock
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, t: f64) {
        self.bits.store(t.to_bits(), Ordering::SeqCst);
    }

    /// Advance the clock by `delta` seconds (`delta` may be negative only
    /// in tests that intentionally probe engine robustness; production
    /// code never does this).
    pub fn advance(&self, delta: f64) {
        let current = f64::from_bits(self.bits.load(Ordering::SeqCst));
        self.set(current + delta);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
