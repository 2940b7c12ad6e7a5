//! Shared helpers for the `hidsd` end-to-end specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

pub const SPEC_POLL_INTERVAL_MS: u64 = 20;
pub const SPEC_WAIT_MAX_MS: u64 = 3000;

/// Resolves a workspace binary the same way a sibling crate's tests do:
/// relative to this test binary's own `target/debug` directory, so it
/// works regardless of which package's `cargo test` invocation built it.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

pub fn hidsd_binary() -> PathBuf {
    binary_path("hidsd")
}

/// Poll `condition` until it returns true or `timeout_ms` elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll_interval = Duration::from_millis(SPEC_POLL_INTERVAL_MS);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

pub fn wait_for_contains(path: impl AsRef<Path>, needle: &str) -> bool {
    wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::read_to_string(path.as_ref())
            .map(|contents| contents.contains(needle))
            .unwrap_or(false)
    })
}

/// A running `hidsd` process over an isolated tempdir, with every log
/// path named explicitly via a generated `HIDS_CONFIG` file.
pub struct Daemon {
    dir: tempfile::TempDir,
    child: Child,
}

impl Daemon {
    /// Start `hidsd` tailing `auth.log` in a fresh tempdir, logging
    /// everything else (runtime/detection/alerts/stdout) under the same
    /// directory so a failing test can be inspected after the fact.
    pub fn start() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let auth_log = dir.path().join("auth.log");
        std::fs::write(&auth_log, "").expect("create auth.log");

        let config_path = dir.path().join("config.toml");
        let config = format!(
            "tailed_log_path = {tailed:?}\n\
             poll_interval_secs = 0.02\n\
             num_workers = 2\n\
             runtime_log_path = {runtime:?}\n\
             detection_log_path = {detection:?}\n\
             alert_log_path = {alert:?}\n",
            tailed = auth_log.display().to_string(),
            runtime = dir.path().join("runtime.log").display().to_string(),
            detection = dir.path().join("detection.log").display().to_string(),
            alert = dir.path().join("alerts.log").display().to_string(),
        );
        std::fs::write(&config_path, config).expect("write config.toml");

        let stdout_path = dir.path().join("stdout.log");
        let stdout_file = std::fs::File::create(&stdout_path).expect("create stdout.log");

        let child = Command::new(hidsd_binary())
            .env("HIDS_CONFIG", &config_path)
            .env("DEBUG_MODE", "false")
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::piped())
            .current_dir(dir.path())
            .spawn()
            .expect("spawn hidsd");

        let daemon = Self { dir, child };
        assert!(
            wait_for_contains(daemon.stdout_path(), "READY"),
            "hidsd did not report READY in time; stdout: {}",
            std::fs::read_to_string(daemon.stdout_path()).unwrap_or_default(),
        );
        daemon
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn stdout_path(&self) -> PathBuf {
        self.dir.path().join("stdout.log")
    }

    pub fn append_auth_line(&self, line: &str) {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(self.path("auth.log"))
            .expect("open auth.log for append");
        writeln!(file, "{line}").expect("append auth.log line");
    }

    pub fn alerts(&self) -> String {
        std::fs::read_to_string(self.path("alerts.log")).unwrap_or_default()
    }

    pub fn wait_for_alert_containing(&self, needle: &str) -> bool {
        wait_for_contains(self.path("alerts.log"), needle)
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
