// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn submit_then_recv_round_trips_one_item() {
    let channel = EventChannel::new(BackpressurePolicy::Warn);
    assert!(channel.submit(SrcId::new("1.2.3.4")).await);
    assert_eq!(channel.qsize(), 1);
    let item = channel.recv_timeout(Duration::from_millis(100)).await;
    assert_eq!(item, Some(SrcId::new("1.2.3.4")));
    assert_eq!(channel.qsize(), 0);
}

#[tokio::test]
async fn recv_timeout_returns_none_on_empty_queue() {
    let channel = EventChannel::new(BackpressurePolicy::Warn);
    let item = channel.recv_timeout(Duration::from_millis(50)).await;
    assert!(item.is_none());
}

#[tokio::test]
async fn drop_policy_rejects_once_over_threshold() {
    let channel = EventChannel::new(BackpressurePolicy::Drop);
    for i in 0..=BACKPRESSURE_THRESHOLD {
        channel.qsize.fetch_add(1, Ordering::SeqCst);
        let _ = i;
    }
    // qsize is now BACKPRESSURE_THRESHOLD + 1, strictly over threshold.
    assert!(!channel.submit(SrcId::new("9.9.9.9")).await);
}

#[tokio::test]
async fn warn_policy_still_enqueues_over_threshold() {
    let channel = EventChannel::new(BackpressurePolicy::Warn);
    for _ in 0..=BACKPRESSURE_THRESHOLD {
        channel.qsize.fetch_add(1, Ordering::SeqCst);
    }
    assert!(channel.submit(SrcId::new("9.9.9.9")).await);
}

#[tokio::test(start_paused = true)]
async fn delay_policy_drops_after_max_wait_when_queue_never_drains() {
    let channel = EventChannel::new(BackpressurePolicy::Delay);
    for _ in 0..=BACKPRESSURE_THRESHOLD {
        channel.qsize.fetch_add(1, Ordering::SeqCst);
    }
    let started = tokio::time::Instant::now();
    assert!(!channel.submit(SrcId::new("9.9.9.9")).await);
    assert!(started.elapsed() >= DELAY_MAX_WAIT);
}
