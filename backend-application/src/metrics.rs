use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    check_ins: AtomicU64,
    incremental_checks: AtomicU64,
    detection_failures: AtomicU64,
    full_scans: AtomicU64,
    logs_scanned: AtomicU64,
    anomalies: AtomicU64,
    anomalies_resolved: AtomicU64,
}

impl Metrics {
    pub fn record_check_in(&self) {
        self.check_ins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_incremental_check(&self) {
        self.incremental_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection_failure(&self) {
        self.detection_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_full_scan(&self, logs_scanned: usize) {
        self.full_scans.fetch_add(1, Ordering::Relaxed);
        self.logs_scanned
            .fetch_add(logs_scanned as u64, Ordering::Relaxed);
    }

    pub fn record_anomalies(&self, count: usize) {
        self.anomalies.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_resolved(&self) {
        self.anomalies_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let check_ins = self.check_ins.load(Ordering::Relaxed);
        let checks = self.incremental_checks.load(Ordering::Relaxed);
        let failures = self.detection_failures.load(Ordering::Relaxed);
        let scans = self.full_scans.load(Ordering::Relaxed);
        let scanned = self.logs_scanned.load(Ordering::Relaxed);
        let anomalies = self.anomalies.load(Ordering::Relaxed);
        let resolved = self.anomalies_resolved.load(Ordering::Relaxed);

        format!(
            "# TYPE ghostwatch_check_ins_total counter\n\
ghostwatch_check_ins_total {}\n\
# TYPE ghostwatch_incremental_checks_total counter\n\
ghostwatch_incremental_checks_total {}\n\
# TYPE ghostwatch_detection_failures_total counter\n\
ghostwatch_detection_failures_total {}\n\
# TYPE ghostwatch_full_scans_total counter\n\
ghostwatch_full_scans_total {}\n\
# TYPE ghostwatch_logs_scanned_total counter\n\
ghostwatch_logs_scanned_total {}\n\
# TYPE ghostwatch_anomalies_total counter\n\
ghostwatch_anomalies_total {}\n\
# TYPE ghostwatch_anomalies_resolved_total counter\n\
ghostwatch_anomalies_resolved_total {}\n",
            check_ins, checks, failures, scans, scanned, anomalies, resolved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_counter() {
        let metrics = Metrics::default();
        metrics.record_check_in();
        metrics.record_full_scan(42);
        metrics.record_anomalies(3);
        let text = metrics.render_prometheus();
        assert!(text.contains("ghostwatch_check_ins_total 1\n"));
        assert!(text.contains("ghostwatch_full_scans_total 1\n"));
        assert!(text.contains("ghostwatch_logs_scanned_total 42\n"));
        assert!(text.contains("ghostwatch_anomalies_total 3\n"));
        assert!(text.contains("ghostwatch_detection_failures_total 0\n"));
    }
}
