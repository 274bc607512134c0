use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use wardline_config::Guard;

use crate::error::Throttle;

/// Arrival times of admitted requests, oldest first.
type Log = VecDeque<Instant>;

#[derive(Debug, Clone, Copy)]
struct Limit {
    max_requests: usize,
    window: Duration,
}

impl Limit {
    /// Drops arrivals that have left the rolling window.
    fn prune(&self, log: &mut Log, now: Instant) {
        while let Some(oldest) = log.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }
    }

    fn has_room(&self, log: &Log) -> bool {
        log.len() < self.max_requests
    }
}

/// Sliding-log flood control per phone and per gateway session. Only
/// admitted requests are recorded, and only once both limiters agree.
pub struct AbuseGuard {
    phone: Limit,
    session: Limit,
    phones: Mutex<HashMap<String, Log>>,
    sessions: Mutex<HashMap<String, Log>>,
}

impl AbuseGuard {
    pub fn new(cfg: &Guard) -> Self {
        Self {
            phone: Limit {
                max_requests: cfg.phone_max_requests,
                window: Duration::from_millis(cfg.phone_window_ms),
            },
            session: Limit {
                max_requests: cfg.session_max_requests,
                window: Duration::from_millis(cfg.session_window_ms),
            },
            phones: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The phone limiter is consulted first; a blank session id skips the
    /// session limiter.
    pub async fn check(&self, phone: &str, session_id: &str, now: Instant) -> Result<(), Throttle> {
        let mut phones = self.phones.lock().await;
        let mut sessions = self.sessions.lock().await;

        let phone_log = phones.entry(phone.to_string()).or_default();
        self.phone.prune(phone_log, now);
        if !self.phone.has_room(phone_log) {
            return Err(Throttle::Phone);
        }

        let session_id = session_id.trim();
        if !session_id.is_empty() {
            let session_log = sessions.entry(session_id.to_string()).or_default();
            self.session.prune(session_log, now);
            if !self.session.has_room(session_log) {
                return Err(Throttle::Session);
            }
            session_log.push_back(now);
        }
        phone_log.push_back(now);
        Ok(())
    }

    /// Drops keys with no arrivals left in their window. Returns how many went.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut removed = 0;
        for (limit, logs) in [(&self.phone, &self.phones), (&self.session, &self.sessions)] {
            let mut logs = logs.lock().await;
            let before = logs.len();
            logs.retain(|_, log| {
                limit.prune(log, now);
                !log.is_empty()
            });
            removed += before - logs.len();
        }
        removed
    }

    #[cfg(test)]
    async fn tracked(&self) -> (usize, usize) {
        (self.phones.lock().await.len(), self.sessions.lock().await.len())
    }
}
