use super::*;
use std::io::Write as _;
use std::sync::atomic::Ordering;
use tempfile::NamedTempFile;

#[test]
fn extract_ip_finds_first_dotted_quad() {
    let line = "authentication error from 10.0.0.5 then 10.0.0.6";
    assert_eq!(extract_ip(line), Some("10.0.0.5"));
}

#[test]
fn extract_ip_returns_none_without_an_address() {
    assert_eq!(extract_ip("authentication error, no address here"), None);
}

#[test]
fn failure_pattern_is_case_insensitive() {
    assert!(failure_pattern().is_match("LOGIN FAILED for root"));
    assert!(failure_pattern().is_match("Authentication Rejected"));
    assert!(!failure_pattern().is_match("session opened for user root"));
}

#[test]
fn dedup_cache_suppresses_within_ttl_and_allows_after() {
    let mut cache = DedupCache::new();
    assert!(!cache.is_duplicate("1.2.3.4:line".to_string()));
    assert!(cache.is_duplicate("1.2.3.4:line".to_string()));

    // Force eviction by rewriting an artificially old timestamp.
    let old = std::time::Instant::now() - CACHE_TTL - Duration::from_millis(10);
    cache.seen.insert("1.2.3.4:line".to_string(), old);
    assert!(!cache.is_duplicate("1.2.3.4:line".to_string()));
}

#[tokio::test]
async fn run_enqueues_extracted_ip_for_matching_lines_only() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "seed line written before the tailer starts").unwrap();
    let path = file.path().to_path_buf();

    let shutdown = Arc::new(AtomicBool::new(false));
    let tailer = LogTailer::new(&path, Arc::clone(&shutdown))
        .with_poll_interval(Duration::from_millis(20));

    let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let events_for_task = Arc::clone(&events);
    let handle = tokio::spawn(async move {
        let _ = tailer
            .run(|src| events_for_task.lock().push(src.as_str().to_string()))
            .await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "session opened for user root").unwrap();
        writeln!(f, "authentication error from 192.168.1.50").unwrap();
        writeln!(f, "login failed, no address present").unwrap();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    shutdown.store(true, Ordering::Relaxed);
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("tailer task exits promptly after shutdown")
        .unwrap();

    let collected = events.lock().clone();
    assert_eq!(collected, vec!["192.168.1.50".to_string()]);
}

#[tokio::test]
async fn run_ignores_duplicate_lines_within_the_dedup_window() {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();
    let shutdown = Arc::new(AtomicBool::new(false));
    let tailer = LogTailer::new(&path, Arc::clone(&shutdown))
        .with_poll_interval(Duration::from_millis(10));

    let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let events_for_task = Arc::clone(&events);
    let handle = tokio::spawn(async move {
        let _ = tailer
            .run(|src| events_for_task.lock().push(src.as_str().to_string()))
            .await;
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "authentication error from 10.1.1.1").unwrap();
        writeln!(f, "authentication error from 10.1.1.1").unwrap();
    }
    tokio::time::sleep(Duration::from_millis(60)).await;

    shutdown.store(true, Ordering::Relaxed);
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(events.lock().len(), 1);
}

#[test]
fn collect_events_returns_empty_for_nonpositive_limit() {
    let file = NamedTempFile::new().unwrap();
    assert!(collect_events(0, file.path()).is_empty());
    assert!(collect_events(-3, file.path()).is_empty());
}

#[test]
fn collect_events_returns_empty_for_missing_file() {
    assert!(collect_events(5, "/nonexistent/path/for/sure.log").is_empty());
}

#[test]
fn collect_events_returns_last_limit_trimmed_lines() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "x").unwrap();
    writeln!(file, "y").unwrap();
    writeln!(file, "z").unwrap();

    let events = collect_events(2, file.path());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].message, "y");
    assert_eq!(events[1].message, "z");
    assert!(events.iter().all(|e| e.event_type == "log_line"));
}

#[test]
fn collect_events_skips_blank_lines() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "a").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "b").unwrap();

    let events = collect_events(5, file.path());
    let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["a", "b"]);
}
