// src/utils/monitoring.rs
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::utils::metrics::PipelineMetrics;

/// Periodically logs the pipeline counters until shutdown is signalled.
pub struct Monitor {
    metrics: Arc<PipelineMetrics>,
    log_interval: Duration,
}

impl Monitor {
    pub fn new(metrics: Arc<PipelineMetrics>, log_interval: Duration) -> Self {
        Self { metrics, log_interval }
    }

    pub fn start(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.log_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.log_metrics(),
                    _ = shutdown.changed() => break,
                }
            }
            self.log_metrics();
        })
    }

    fn log_metrics(&self) {
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            uptime_secs = snapshot.uptime.as_secs(),
            frames_captured = snapshot.frames_captured,
            frames_analyzed = snapshot.frames_analyzed,
            recognition_failures = snapshot.recognition_failures,
            connection_failures = snapshot.connection_failures,
            accepted = snapshot.admissions_accepted,
            rejected = snapshot.admissions_rejected,
            persisted = snapshot.records_persisted,
            persist_failures = snapshot.records_failed,
            notify_failures = snapshot.notifications_failed,
            "Pipeline metrics"
        );
    }
}
