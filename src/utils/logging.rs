//! Verbosity-gated progress logging.
//!
//! Informational progress lines are only emitted when verbose mode is on.
//! Verbose mode starts from the `VERBOSE` environment variable and can be
//! switched at runtime with [`set_verbose`].

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

static VERBOSE: Lazy<AtomicBool> = Lazy::new(|| {
    let enabled = std::env::var("VERBOSE")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    AtomicBool::new(enabled)
});

static COUNTERS: Lazy<Mutex<HashMap<String, usize>>> = Lazy::new(|| Mutex::new(HashMap::new()));

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn verbose_log(message: impl Display) {
    if is_verbose() {
        tracing::info!("{}", message);
    }
}

/// Increments the counter for `label` and logs its new value in verbose mode.
/// Returns the new value.
pub fn verbose_count(label: &str) -> usize {
    let mut counters = COUNTERS.lock().unwrap_or_else(|e| e.into_inner());
    let count = counters.entry(label.to_string()).or_insert(0);
    *count += 1;
    verbose_log(format!("{}: {}", label, count));
    *count
}

pub fn reset_count(label: &str) {
    COUNTERS
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(label);
}

/// Installs a fmt subscriber filtered by `RUST_LOG` (default `info`).
/// Calling it more than once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
