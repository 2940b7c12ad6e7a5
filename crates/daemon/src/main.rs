// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hidsd`: the thin composition root (§10.3). Loads configuration,
//! bootstraps logging, wires the alert sink into the detection engine,
//! starts the worker pool, tails the authentication log, and waits for
//! `SIGTERM`/`SIGINT` before a bounded, ordered shutdown.

use hids_adapters::{setup_alert_system, LogTailer};
use hids_core::{Severity, SrcId, SystemClock};
use hids_daemon::{setup_logging, RuntimeConfig, StartupError};
use hids_engine::{Engine, RuntimeManager};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};

/// Grace period `stop()` waits per worker before logging a timeout and
/// proceeding with process exit regardless (§4.9/§7).
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

fn print_usage() {
    println!("hidsd {}", env!("CARGO_PKG_VERSION"));
    println!("Host-based authentication-failure detection daemon.");
    println!();
    println!("USAGE:");
    println!("    hidsd [--version | --help]");
    println!();
    println!("CONFIGURATION:");
    println!("    HIDS_CONFIG   path to an optional TOML overrides file");
    println!("    DEBUG_MODE    \"true\"/\"false\", overrides the config file");
    println!("    HIDS_LOG_DIR  directory for runtime/detection/alert logs");
}

fn main() -> std::process::ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--version") {
        println!("hidsd {}", env!("CARGO_PKG_VERSION"));
        return std::process::ExitCode::SUCCESS;
    }
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return std::process::ExitCode::SUCCESS;
    }

    match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => match rt.block_on(run()) {
            Ok(()) => std::process::ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("hidsd: fatal startup error: {err}");
                std::process::ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("hidsd: failed to build tokio runtime: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = RuntimeConfig::load()?;
    let _logging_guard = setup_logging(&config)?;

    tracing::info!(target: "runtime", ?config, "starting hidsd");

    let alert_sink = setup_alert_system(
        config.alert_log_path.clone(),
        config.alert_log_rotation.max_bytes,
        config.alert_log_rotation.backup_count,
        Severity::Info,
    )?;

    let engine = Arc::new(Engine::new(Arc::new(SystemClock::new()), alert_sink));
    let runtime = RuntimeManager::get_instance(
        engine,
        config.num_workers,
        config.backpressure_policy,
        true,
    )
    .await;

    let shutdown = Arc::new(AtomicBool::new(false));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SrcId>();

    let tailer_shutdown = Arc::clone(&shutdown);
    let tailer_path = config.tailed_log_path.clone();
    let poll_interval = Duration::from_secs_f64(config.poll_interval_secs.max(0.0));
    let tailer_handle = tokio::spawn(async move {
        let tailer = LogTailer::new(tailer_path, tailer_shutdown).with_poll_interval(poll_interval);
        if let Err(err) = tailer.run(|src| {
            // `LogTailer::run`'s callback is synchronous; bridge onto the
            // async `Runtime::submit_event` through this channel instead
            // of blocking the tail loop on the engine's queue.
            let _ = tx.send(src);
        }).await {
            tracing::error!(target: "runtime", error = %err, "log tailer stopped");
        }
    });

    let feed_runtime = Arc::clone(&runtime);
    let feed_handle = tokio::spawn(async move {
        while let Some(src) = rx.recv().await {
            feed_runtime.submit_event(src).await;
        }
    });

    println!("READY");
    tracing::info!(target: "runtime", "hidsd ready");

    wait_for_termination().await?;

    tracing::info!(target: "runtime", "shutdown signal received, stopping");
    shutdown.store(true, Ordering::SeqCst);
    tailer_handle.abort();
    feed_handle.abort();

    if let Err(err) = runtime.stop(SHUTDOWN_TIMEOUT).await {
        tracing::warn!(target: "runtime", error = %err, "runtime did not stop cleanly");
    }

    tracing::info!(target: "runtime", "hidsd stopped");
    Ok(())
}

async fn wait_for_termination() -> Result<(), StartupError> {
    let mut sigterm = signal(SignalKind::terminate()).map_err(StartupError::Signal)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(StartupError::Signal)?;
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
    Ok(())
}
