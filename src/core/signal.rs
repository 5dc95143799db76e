//! # Host teardown helper.
//!
//! The scheduler never installs process signal handlers: the host owns
//! its exit mechanism and registers its own teardown hook, which should
//! call [`Scheduler::shutdown`](crate::Scheduler::shutdown) with a
//! bounded grace period. [`shutdown_signal`] is the building block for
//! hosts that want the usual "stop on SIGINT/SIGTERM" behavior.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskloom::{shutdown_signal, Scheduler, SchedulerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = Scheduler::builder(SchedulerConfig::default()).build();
//!     scheduler.start()?;
//!
//!     shutdown_signal().await?;
//!     // shutdown() blocks while draining; keep it off the async runtime.
//!     let scheduler = Arc::clone(&scheduler);
//!     tokio::task::spawn_blocking(move || scheduler.shutdown(Duration::from_secs(5))).await??;
//!     Ok(())
//! }
//! ```

/// Completes when the process receives a termination signal.
///
/// Unix: `SIGINT` (Ctrl-C) or `SIGTERM`. Elsewhere: Ctrl-C. Each call
/// registers independent listeners; no handler outlives the returned
/// future.
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

/// Completes when the process receives a termination signal.
///
/// Non-Unix platforms listen for Ctrl-C only.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
