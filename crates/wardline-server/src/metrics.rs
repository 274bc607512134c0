use std::sync::atomic::{AtomicU64, Ordering};

use wardline_contracts::MetricsSnapshot;

#[derive(Debug, Clone, Copy)]
pub enum Counter {
    Requests,
    Malformed,
    RateLimited,
    Registrations,
    Issues,
    IssueWriteFailures,
    Applications,
}

/// Process-local counters exposed on `/v1/metrics`.
#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    malformed: AtomicU64,
    rate_limited: AtomicU64,
    registrations: AtomicU64,
    issues: AtomicU64,
    issue_write_failures: AtomicU64,
    applications: AtomicU64,
}

impl Metrics {
    pub fn incr(&self, counter: Counter) {
        let cell = match counter {
            Counter::Requests => &self.requests,
            Counter::Malformed => &self.malformed,
            Counter::RateLimited => &self.rate_limited,
            Counter::Registrations => &self.registrations,
            Counter::Issues => &self.issues,
            Counter::IssueWriteFailures => &self.issue_write_failures,
            Counter::Applications => &self.applications,
        };
        cell.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let read = |cell: &AtomicU64| cell.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests: read(&self.requests),
            malformed: read(&self.malformed),
            rate_limited: read(&self.rate_limited),
            registrations: read(&self.registrations),
            issues: read(&self.issues),
            issue_write_failures: read(&self.issue_write_failures),
            applications: read(&self.applications),
        }
    }
}
