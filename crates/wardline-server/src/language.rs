use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use wardline_contracts::Language;

#[derive(Debug, Clone, Copy)]
struct LanguageContext {
    language: Language,
    last_activity: Instant,
}

/// Remembers each caller's language across gateway sessions for a short idle TTL.
pub struct LanguageStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, LanguageContext>>,
}

impl LanguageStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Live entries are touched; stale ones are evicted and read as absent.
    pub async fn resolve(&self, phone: &str, now: Instant) -> Option<Language> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(phone)?;
        if now.saturating_duration_since(entry.last_activity) >= self.ttl {
            entries.remove(phone);
            return None;
        }
        entry.last_activity = now;
        Some(entry.language)
    }

    pub async fn set(&self, phone: &str, language: Language, now: Instant) {
        self.entries.lock().await.insert(
            phone.to_string(),
            LanguageContext {
                language,
                last_activity: now,
            },
        );
    }

    pub async fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| now.saturating_duration_since(e.last_activity) < self.ttl);
        before - entries.len()
    }
}
