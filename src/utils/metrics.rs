// src/utils/metrics.rs
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{Duration, Instant};

/// Process-wide pipeline counters, shared by every camera worker.
pub struct PipelineMetrics {
    start_time: Instant,
    frames_captured: AtomicU64,
    frames_analyzed: AtomicU64,
    recognition_failures: AtomicU64,
    connection_failures: AtomicU64,
    admissions_accepted: AtomicU64,
    admissions_rejected: AtomicU64,
    records_persisted: AtomicU64,
    records_failed: AtomicU64,
    notifications_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub frames_captured: u64,
    pub frames_analyzed: u64,
    pub recognition_failures: u64,
    pub connection_failures: u64,
    pub admissions_accepted: u64,
    pub admissions_rejected: u64,
    pub records_persisted: u64,
    pub records_failed: u64,
    pub notifications_failed: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            frames_captured: AtomicU64::new(0),
            frames_analyzed: AtomicU64::new(0),
            recognition_failures: AtomicU64::new(0),
            connection_failures: AtomicU64::new(0),
            admissions_accepted: AtomicU64::new(0),
            admissions_rejected: AtomicU64::new(0),
            records_persisted: AtomicU64::new(0),
            records_failed: AtomicU64::new(0),
            notifications_failed: AtomicU64::new(0),
        }
    }

    pub fn record_frame(&self, analyzed: bool) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
        if analyzed {
            self.frames_analyzed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_recognition_failure(&self) {
        self.recognition_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_failure(&self) {
        self.connection_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admission(&self, accepted: bool) {
        if accepted {
            self.admissions_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.admissions_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_persistence(&self, success: bool) {
        if success {
            self.records_persisted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.records_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_notification_failure(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_analyzed: self.frames_analyzed.load(Ordering::Relaxed),
            recognition_failures: self.recognition_failures.load(Ordering::Relaxed),
            connection_failures: self.connection_failures.load(Ordering::Relaxed),
            admissions_accepted: self.admissions_accepted.load(Ordering::Relaxed),
            admissions_rejected: self.admissions_rejected.load(Ordering::Relaxed),
            records_persisted: self.records_persisted.load(Ordering::Relaxed),
            records_failed: self.records_failed.load(Ordering::Relaxed),
            notifications_failed: self.notifications_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
