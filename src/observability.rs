//! Logging setup and grabber counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `verbosity`.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Per-grabber counters
#[derive(Debug, Default)]
pub struct GrabMetrics {
    objects_fetched: AtomicU64,
    bytes_fetched: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
}

impl GrabMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetched(&self, bytes: u64) {
        self.objects_fetched.fetch_add(1, Ordering::Relaxed);
        self.bytes_fetched.fetch_add(bytes, Ordering::Relaxed);
        tracing::debug!(counter = "objects_fetched", bytes, "Metric incremented");
    }

    pub fn retried(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "retries", "Metric incremented");
    }

    pub fn failed(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            objects_fetched: self.objects_fetched.load(Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub objects_fetched: u64,
    pub bytes_fetched: u64,
    pub retries: u64,
    pub failures: u64,
}
