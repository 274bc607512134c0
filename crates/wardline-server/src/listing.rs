use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;
use wardline_contracts::ListItem;

use crate::error::StoreError;
use crate::store::SharedStore;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Listings {
    pub announcements: Vec<ListItem>,
    pub projects: Vec<ListItem>,
}

/// Read-through cache of the News and Projects menus.
pub struct ListingCache {
    ttl: Duration,
    limit: usize,
    current: Mutex<Option<(Instant, Arc<Listings>)>>,
}

impl ListingCache {
    pub fn new(ttl: Duration, limit: usize) -> Self {
        Self {
            ttl,
            limit,
            current: Mutex::new(None),
        }
    }

    /// Returns the cached snapshot, reloading it once it is older than the TTL.
    /// A failed reload keeps serving whatever was loaded last.
    pub async fn snapshot(&self, store: &SharedStore, now: Instant) -> Arc<Listings> {
        let mut current = self.current.lock().await;
        if let Some((loaded_at, listings)) = current.as_ref() {
            if now.saturating_duration_since(*loaded_at) < self.ttl {
                return listings.clone();
            }
        }

        match self.load(store).await {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                *current = Some((now, fresh.clone()));
                fresh
            }
            Err(err) => {
                warn!(error = %err, "listing refresh failed; serving previous snapshot");
                current
                    .as_ref()
                    .map(|(_, listings)| listings.clone())
                    .unwrap_or_default()
            }
        }
    }

    async fn load(&self, store: &SharedStore) -> Result<Listings, StoreError> {
        let limit = self.limit;
        store
            .call(move |s| {
                Ok(Listings {
                    announcements: s.list_announcements(limit)?,
                    projects: s.list_projects(limit)?,
                })
            })
            .await
    }
}
