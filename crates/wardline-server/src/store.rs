use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;
use uuid::Uuid;
use wardline_contracts::{
    BursaryApplicationRecord, IssueRecord, ListItem, RegistrationRecord, RegistrationSummary,
    VerificationStatus,
};
use wardline_kernel::drafts::RegistrationDraft;

use crate::error::StoreError;

/// Registration source recorded for every row written through this service.
const SOURCE_USSD: &str = "ussd";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(1_000);

#[derive(Default)]
pub struct MemoryStore {
    registrations: HashMap<String, RegistrationRecord>,
    issues: Vec<IssueRecord>,
    applications: Vec<BursaryApplicationRecord>,
    announcements: Vec<ListItem>,
    projects: Vec<ListItem>,
}

pub struct SqliteStore {
    conn: Connection,
}

pub enum StoreBackend {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl StoreBackend {
    pub fn open(kind: &str, sqlite_path: Option<&str>) -> Result<Self, StoreError> {
        if kind == "sqlite" {
            let path = sqlite_path.ok_or_else(|| {
                StoreError::Backend("store.sqlite_path is required for sqlite store".to_string())
            })?;
            Ok(StoreBackend::Sqlite(SqliteStore::new(path)?))
        } else {
            Ok(StoreBackend::Memory(MemoryStore::default()))
        }
    }

    /// SQLite lock waits must end before the caller's own store timeout does.
    pub fn set_busy_timeout(&self, busy: Duration) -> Result<(), StoreError> {
        if let StoreBackend::Sqlite(store) = self {
            store.conn.busy_timeout(busy)?;
        }
        Ok(())
    }

    pub fn find_by_phone(&self, phone: &str) -> Result<Option<RegistrationSummary>, StoreError> {
        match self {
            StoreBackend::Memory(store) => Ok(store.registrations.get(phone).map(summary)),
            StoreBackend::Sqlite(store) => store.find_by_phone(phone),
        }
    }

    pub fn find_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<RegistrationSummary>, StoreError> {
        match self {
            StoreBackend::Memory(store) => Ok(store
                .registrations
                .values()
                .find(|r| r.national_id == national_id)
                .map(summary)),
            StoreBackend::Sqlite(store) => store.find_by_national_id(national_id),
        }
    }

    /// Creates or updates the caller's registration. Any update sends the
    /// record back to `pending`; an ID held by another phone is a duplicate.
    pub fn upsert_registration(
        &mut self,
        phone: &str,
        draft: &RegistrationDraft,
        now: &str,
    ) -> Result<RegistrationRecord, StoreError> {
        if let Some(owner) = self.find_by_national_id(&draft.national_id)? {
            if owner.phone_number != phone {
                return Err(StoreError::DuplicateKey("national_id".to_string()));
            }
        }
        match self {
            StoreBackend::Memory(store) => {
                let (id, created_at) = match store.registrations.get(phone) {
                    Some(existing) => (existing.id.clone(), existing.created_at.clone()),
                    None => (new_id("reg"), now.to_string()),
                };
                let record = RegistrationRecord {
                    id,
                    phone_number: phone.to_string(),
                    full_name: draft.full_name.clone(),
                    national_id: draft.national_id.clone(),
                    location: draft.location.clone(),
                    village: draft.village.clone(),
                    status: VerificationStatus::Pending,
                    source: SOURCE_USSD.to_string(),
                    created_at,
                    updated_at: now.to_string(),
                };
                store
                    .registrations
                    .insert(phone.to_string(), record.clone());
                Ok(record)
            }
            StoreBackend::Sqlite(store) => store.upsert_registration(phone, draft, now),
        }
    }

    pub fn insert_issue(&mut self, record: &IssueRecord) -> Result<(), StoreError> {
        match self {
            StoreBackend::Memory(store) => {
                if store.issues.iter().any(|i| i.ticket == record.ticket) {
                    return Err(StoreError::DuplicateKey("ticket".to_string()));
                }
                store.issues.push(record.clone());
                Ok(())
            }
            StoreBackend::Sqlite(store) => store.insert_issue(record),
        }
    }

    pub fn insert_application(&mut self, record: &BursaryApplicationRecord) -> Result<(), StoreError> {
        match self {
            StoreBackend::Memory(store) => {
                if store
                    .applications
                    .iter()
                    .any(|a| a.application_number == record.application_number)
                {
                    return Err(StoreError::DuplicateKey("application_number".to_string()));
                }
                store.applications.push(record.clone());
                Ok(())
            }
            StoreBackend::Sqlite(store) => store.insert_application(record),
        }
    }

    pub fn list_announcements(&self, limit: usize) -> Result<Vec<ListItem>, StoreError> {
        match self {
            StoreBackend::Memory(store) => Ok(store.announcements.iter().take(limit).cloned().collect()),
            StoreBackend::Sqlite(store) => store.list_announcements(limit),
        }
    }

    pub fn list_projects(&self, limit: usize) -> Result<Vec<ListItem>, StoreError> {
        match self {
            StoreBackend::Memory(store) => Ok(store.projects.iter().take(limit).cloned().collect()),
            StoreBackend::Sqlite(store) => store.list_projects(limit),
        }
    }
}

fn summary(record: &RegistrationRecord) -> RegistrationSummary {
    RegistrationSummary {
        phone_number: record.phone_number.clone(),
        national_id: Some(record.national_id.clone()),
        status: record.status,
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

impl SqliteStore {
    fn new(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS registrations (
                id TEXT PRIMARY KEY,
                phone_number TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                national_id TEXT NOT NULL UNIQUE,
                location TEXT NOT NULL,
                village TEXT NOT NULL,
                status TEXT NOT NULL,
                source TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS issues (
                id TEXT PRIMARY KEY,
                ticket TEXT NOT NULL UNIQUE,
                phone_number TEXT NOT NULL,
                category TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                location TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS issues_by_phone ON issues (phone_number);
            CREATE TABLE IF NOT EXISTS bursary_applications (
                id TEXT PRIMARY KEY,
                application_number TEXT NOT NULL UNIQUE,
                phone_number TEXT NOT NULL,
                category TEXT NOT NULL,
                student_name TEXT NOT NULL,
                institution TEXT NOT NULL,
                admission_number TEXT NOT NULL,
                amount INTEGER NOT NULL,
                household_status TEXT NOT NULL,
                guardian_phone TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS announcements (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                published INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }

    fn find_by_phone(&self, phone: &str) -> Result<Option<RegistrationSummary>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT phone_number, national_id, status FROM registrations WHERE phone_number = ?1",
                params![phone],
                summary_row,
            )
            .optional()?)
    }

    fn find_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<RegistrationSummary>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT phone_number, national_id, status FROM registrations WHERE national_id = ?1",
                params![national_id],
                summary_row,
            )
            .optional()?)
    }

    fn upsert_registration(
        &mut self,
        phone: &str,
        draft: &RegistrationDraft,
        now: &str,
    ) -> Result<RegistrationRecord, StoreError> {
        self.conn.execute(
            "
            INSERT INTO registrations
                (id, phone_number, full_name, national_id, location, village, status, source, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(phone_number) DO UPDATE SET
                full_name=excluded.full_name,
                national_id=excluded.national_id,
                location=excluded.location,
                village=excluded.village,
                status=excluded.status,
                updated_at=excluded.updated_at
            ",
            params![
                new_id("reg"),
                phone,
                draft.full_name,
                draft.national_id,
                draft.location,
                draft.village,
                VerificationStatus::Pending.as_str(),
                SOURCE_USSD,
                now
            ],
        )?;
        Ok(self.conn.query_row(
            "
            SELECT id, phone_number, full_name, national_id, location, village, status, source, created_at, updated_at
            FROM registrations WHERE phone_number = ?1
            ",
            params![phone],
            |row| {
                Ok(RegistrationRecord {
                    id: row.get(0)?,
                    phone_number: row.get(1)?,
                    full_name: row.get(2)?,
                    national_id: row.get(3)?,
                    location: row.get(4)?,
                    village: row.get(5)?,
                    status: status_column(row, 6)?,
                    source: row.get(7)?,
                    created_at: row.get(8)?,
                    updated_at: row.get(9)?,
                })
            },
        )?)
    }

    fn insert_issue(&mut self, record: &IssueRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "
            INSERT INTO issues (id, ticket, phone_number, category, title, description, location, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                record.id,
                record.ticket,
                record.phone_number,
                record.category,
                record.title,
                record.description,
                record.location,
                record.status,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn insert_application(&mut self, record: &BursaryApplicationRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "
            INSERT INTO bursary_applications
                (id, application_number, phone_number, category, student_name, institution,
                 admission_number, amount, household_status, guardian_phone, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
            params![
                record.id,
                record.application_number,
                record.phone_number,
                record.category,
                record.student_name,
                record.institution,
                record.admission_number,
                (record.amount as i64),
                record.household_status,
                record.guardian_phone,
                record.status,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn list_announcements(&self, limit: usize) -> Result<Vec<ListItem>, StoreError> {
        self.list(
            "SELECT title, body FROM announcements WHERE published = 1 ORDER BY created_at DESC LIMIT ?1",
            limit,
        )
    }

    fn list_projects(&self, limit: usize) -> Result<Vec<ListItem>, StoreError> {
        self.list(
            "SELECT name, description FROM projects ORDER BY created_at DESC LIMIT ?1",
            limit,
        )
    }

    fn list(&self, sql: &str, limit: usize) -> Result<Vec<ListItem>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![(limit as i64)], |row| {
            Ok(ListItem {
                title: row.get(0)?,
                detail: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn summary_row(row: &Row<'_>) -> rusqlite::Result<RegistrationSummary> {
    Ok(RegistrationSummary {
        phone_number: row.get(0)?,
        national_id: row.get(1)?,
        status: status_column(row, 2)?,
    })
}

/// Unknown status text reads as pending rather than failing the lookup.
fn status_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<VerificationStatus> {
    let raw: String = row.get(idx)?;
    Ok(VerificationStatus::parse(&raw).unwrap_or(VerificationStatus::Pending))
}

/// Store handle shared by request tasks and background writers. Every call
/// runs on the blocking pool and is bounded by the configured timeout, lock
/// wait included.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<StoreBackend>>,
    timeout: Duration,
}

impl SharedStore {
    pub fn new(backend: StoreBackend, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(backend)),
            timeout,
        }
    }

    /// On timeout the caller gets `StoreError::Timeout` at once; an operation
    /// already running finishes in the background and then releases the lock.
    pub async fn call<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut StoreBackend) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        let work = async move {
            let mut store = inner.lock_owned().await;
            tokio::task::spawn_blocking(move || op(&mut *store))
                .await
                .map_err(|e| StoreError::Backend(format!("store task failed: {e}")))?
        };
        tokio::time::timeout(self.timeout, work)
            .await
            .unwrap_or(Err(StoreError::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(national_id: &str, village: &str) -> RegistrationDraft {
        RegistrationDraft {
            full_name: "Mary Mwende Kioko".to_string(),
            national_id: national_id.to_string(),
            location: "Kyamatu".to_string(),
            village: village.to_string(),
        }
    }

    fn temp_db(name: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("wardline-{name}-{nanos}.db"))
            .to_string_lossy()
            .to_string()
    }

    fn backends(name: &str) -> Vec<StoreBackend> {
        vec![
            StoreBackend::open("memory", None).unwrap(),
            StoreBackend::open("sqlite", Some(&temp_db(name))).unwrap(),
        ]
    }

    #[test]
    fn same_phone_updates_and_resets_status() {
        for mut store in backends("upsert") {
            let first = store
                .upsert_registration("+254712345678", &draft("12345678", "Kwa Ndolo"), "t1")
                .unwrap();
            if let StoreBackend::Sqlite(s) = &store {
                s.conn
                    .execute("UPDATE registrations SET status = 'verified'", [])
                    .unwrap();
            }
            if let StoreBackend::Memory(s) = &mut store {
                s.registrations
                    .get_mut("+254712345678")
                    .unwrap()
                    .status = VerificationStatus::Verified;
            }
            let second = store
                .upsert_registration("+254712345678", &draft("12345678", "Kwa Mutua"), "t2")
                .unwrap();
            assert_eq!(first.id, second.id);
            assert_eq!(second.village, "Kwa Mutua");
            assert_eq!(second.status, VerificationStatus::Pending);
            assert_eq!(second.created_at, "t1");
            assert_eq!(second.updated_at, "t2");
        }
    }

    #[test]
    fn national_id_on_other_phone_is_duplicate() {
        for mut store in backends("dup") {
            store
                .upsert_registration("+254712345678", &draft("12345678", "Kwa Ndolo"), "t1")
                .unwrap();
            let err = store
                .upsert_registration("+254700000001", &draft("12345678", "Kwa Ndolo"), "t2")
                .unwrap_err();
            assert!(matches!(err, StoreError::DuplicateKey(_)));
            assert!(store.find_by_phone("+254700000001").unwrap().is_none());
        }
    }

    #[test]
    fn sqlite_unique_ticket_maps_to_duplicate_key() {
        let mut store = StoreBackend::open("sqlite", Some(&temp_db("ticket"))).unwrap();
        let record = IssueRecord {
            id: new_id("iss"),
            ticket: "TICK-AAAAAAAAAA".to_string(),
            phone_number: "+254712345678".to_string(),
            category: "Security".to_string(),
            title: "Lights out".to_string(),
            description: "Street lights off for a week".to_string(),
            location: None,
            status: "open".to_string(),
            created_at: "t1".to_string(),
        };
        store.insert_issue(&record).unwrap();
        let again = IssueRecord {
            id: new_id("iss"),
            ..record
        };
        assert!(matches!(
            store.insert_issue(&again),
            Err(StoreError::DuplicateKey(_))
        ));
    }

    #[test]
    fn listings_respect_limit_and_order() {
        let store = StoreBackend::open("sqlite", Some(&temp_db("listing"))).unwrap();
        if let StoreBackend::Sqlite(s) = &store {
            for (i, title) in ["Oldest", "Middle", "Newest"].iter().enumerate() {
                s.conn
                    .execute(
                        "INSERT INTO announcements (id, title, body, created_at) VALUES (?1, ?2, 'x', ?3)",
                        params![new_id("ann"), *title, format!("2026-01-0{}T00:00:00Z", i + 1)],
                    )
                    .unwrap();
            }
        }
        let items = store.list_announcements(2).unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Newest", "Middle"]);
        assert!(store.list_projects(3).unwrap().is_empty());
    }

    #[tokio::test]
    async fn shared_store_times_out_when_lock_is_held() {
        let shared = SharedStore::new(
            StoreBackend::open("memory", None).unwrap(),
            Duration::from_millis(20),
        );
        let _held = shared.inner.lock().await;
        let result = shared.call(|s| s.find_by_phone("+254712345678")).await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn slow_operation_is_cut_off_by_timeout() {
        let shared = SharedStore::new(
            StoreBackend::open("memory", None).unwrap(),
            Duration::from_millis(20),
        );
        let started = std::time::Instant::now();
        let result = shared
            .call(|s| {
                std::thread::sleep(Duration::from_millis(300));
                s.find_by_phone("+254712345678")
            })
            .await;
        assert!(matches!(result, Err(StoreError::Timeout)));
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn lock_is_released_after_slow_operation_finishes() {
        let shared = SharedStore::new(
            StoreBackend::open("memory", None).unwrap(),
            Duration::from_millis(20),
        );
        let _ = shared
            .call(|_| {
                std::thread::sleep(Duration::from_millis(100));
                Ok(())
            })
            .await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let found = shared
            .call(|s| s.find_by_phone("+254712345678"))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
