// Run metrics module
//
// Provides lightweight metrics tracking for a single pipeline run

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for one pipeline run.
///
/// Uses atomic operations for thread-safe tracking without locks; the pool
/// workers bump these from inside work units. A summary is logged once at the
/// end of the run.
#[derive(Debug)]
pub struct Metrics {
    /// Archives discovered by the source scan
    pub archives_found: AtomicUsize,

    /// Archives the unpack stage completed
    pub archives_unpacked: AtomicUsize,

    /// Raw streams discovered by the rescan
    pub streams_found: AtomicUsize,

    /// Streams the convert stage completed
    pub streams_converted: AtomicUsize,

    /// Work units that failed (any stage)
    pub units_failed: AtomicUsize,

    /// Cumulative external-tool wall time in milliseconds
    pub total_tool_time_ms: AtomicU64,

    /// Run start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            archives_found: AtomicUsize::new(0),
            archives_unpacked: AtomicUsize::new(0),
            streams_found: AtomicUsize::new(0),
            streams_converted: AtomicUsize::new(0),
            units_failed: AtomicUsize::new(0),
            total_tool_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_archives_found(&self, count: usize) {
        self.archives_found.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_archive_unpacked(&self) {
        self.archives_unpacked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_streams_found(&self, count: usize) {
        self.streams_found.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_stream_converted(&self) {
        self.streams_converted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unit_failed(&self) {
        self.units_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record external-tool wall time for one invocation
    pub fn record_tool_time(&self, duration: Duration) {
        self.total_tool_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Get total run time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Run Summary ===");
        tracing::info!(
            "Archives: {} found, {} unpacked",
            self.archives_found.load(Ordering::Relaxed),
            self.archives_unpacked.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Streams: {} found, {} converted",
            self.streams_found.load(Ordering::Relaxed),
            self.streams_converted.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Failures: {} units",
            self.units_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Tool time: {:.2}s across {:.2}s of run time",
            self.total_tool_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.elapsed().as_secs_f64()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = Metrics::new();
        assert_eq!(metrics.archives_found.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.streams_converted.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_counts_accumulate() {
        let metrics = Metrics::new();

        metrics.record_archives_found(3);
        metrics.record_archive_unpacked();
        metrics.record_archive_unpacked();
        metrics.record_streams_found(40);
        metrics.record_stream_converted();
        metrics.record_unit_failed();

        assert_eq!(metrics.archives_found.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.archives_unpacked.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.streams_found.load(Ordering::Relaxed), 40);
        assert_eq!(metrics.streams_converted.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.units_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_tool_time_accumulates() {
        let metrics = Metrics::new();
        metrics.record_tool_time(Duration::from_millis(100));
        metrics.record_tool_time(Duration::from_millis(250));
        assert_eq!(metrics.total_tool_time_ms.load(Ordering::Relaxed), 350);
    }
}
