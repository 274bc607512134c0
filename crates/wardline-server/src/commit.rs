use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;
use wardline_contracts::{
    BursaryApplicationRecord, CommitResult, IssueRecord, RegistrationRecord,
};
use wardline_kernel::codes;
use wardline_kernel::drafts::{BursaryDraft, CommitRequest, IssueDraft, RegistrationDraft};
use wardline_kernel::phone::mask_phone;

use crate::error::{EngineError, StoreError};
use crate::metrics::{Counter, Metrics};
use crate::store::SharedStore;

/// Performs the side effect a completed flow asked for.
#[derive(Clone)]
pub struct CommitHandler {
    store: SharedStore,
    metrics: Arc<Metrics>,
    locations: Arc<[String]>,
}

impl CommitHandler {
    pub fn new(store: SharedStore, metrics: Arc<Metrics>, locations: &[String]) -> Self {
        Self {
            store,
            metrics,
            locations: locations.into(),
        }
    }

    pub async fn commit(
        &self,
        phone: &str,
        request: CommitRequest,
    ) -> Result<CommitResult, EngineError> {
        match request {
            CommitRequest::Register(draft) => self
                .register(phone, draft)
                .await
                .map(CommitResult::Registration),
            CommitRequest::ReportIssue(draft) => {
                Ok(CommitResult::Issue(self.report_issue(phone, draft)))
            }
            CommitRequest::ApplyBursary(draft) => self
                .apply_bursary(phone, draft)
                .await
                .map(CommitResult::BursaryApplication),
        }
    }

    async fn register(
        &self,
        phone: &str,
        draft: RegistrationDraft,
    ) -> Result<RegistrationRecord, EngineError> {
        draft
            .check(&self.locations)
            .map_err(EngineError::Validation)?;
        let now = Utc::now().to_rfc3339();
        let owner = phone.to_string();
        let record = self
            .store
            .call(move |s| s.upsert_registration(&owner, &draft, &now))
            .await
            .map_err(|err| {
                if matches!(err, StoreError::DuplicateKey(_)) {
                    warn!(phone = %mask_phone(phone), "national id already held by another phone");
                }
                err
            })?;
        self.metrics.incr(Counter::Registrations);
        info!(
            phone = %mask_phone(phone),
            registration_id = %record.id,
            location = %record.location,
            "registration stored"
        );
        Ok(record)
    }

    /// The ticket is returned at once; the row is written by a detached task
    /// whose failure is only logged and counted.
    fn report_issue(&self, phone: &str, draft: IssueDraft) -> IssueRecord {
        let record = IssueRecord {
            id: format!("iss_{}", Uuid::new_v4().simple()),
            ticket: codes::ticket_code(),
            phone_number: phone.to_string(),
            category: draft.category,
            title: draft.title,
            description: draft.description,
            location: draft.location,
            status: "open".to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let store = self.store.clone();
        let metrics = self.metrics.clone();
        let pending = record.clone();
        tokio::spawn(async move {
            let row = pending.clone();
            match store.call(move |s| s.insert_issue(&row)).await {
                Ok(()) => info!(
                    ticket = %pending.ticket,
                    category = %pending.category,
                    "issue stored"
                ),
                Err(err) => {
                    metrics.incr(Counter::IssueWriteFailures);
                    error!(
                        ticket = %pending.ticket,
                        phone = %mask_phone(&pending.phone_number),
                        error = %err,
                        "issue write failed"
                    );
                }
            }
        });

        self.metrics.incr(Counter::Issues);
        record
    }

    async fn apply_bursary(
        &self,
        phone: &str,
        draft: BursaryDraft,
    ) -> Result<BursaryApplicationRecord, EngineError> {
        let mut record = BursaryApplicationRecord {
            id: format!("bur_{}", Uuid::new_v4().simple()),
            application_number: codes::application_number(),
            phone_number: phone.to_string(),
            category: draft.category,
            student_name: draft.student_name,
            institution: draft.institution,
            admission_number: draft.admission_number,
            amount: draft.amount,
            household_status: draft.household_status,
            guardian_phone: draft.guardian_phone,
            status: "pending".to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let row = record.clone();
        let first = self.store.call(move |s| s.insert_application(&row)).await;
        match first {
            Err(StoreError::DuplicateKey(_)) => {
                warn!(
                    application_number = %record.application_number,
                    "application number collision; retrying with a fresh one"
                );
                record.application_number = codes::application_number();
                let row = record.clone();
                self.store
                    .call(move |s| s.insert_application(&row))
                    .await
                    .map_err(|err| match err {
                        StoreError::DuplicateKey(key) => EngineError::ServiceUnavailable(
                            format!("application number collided twice on {key}"),
                        ),
                        other => other.into(),
                    })?;
            }
            other => other?,
        }

        self.metrics.incr(Counter::Applications);
        info!(
            phone = %mask_phone(phone),
            application_number = %record.application_number,
            amount = record.amount,
            "bursary application stored"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::StoreBackend;

    fn handler() -> (CommitHandler, Arc<Metrics>) {
        let store = SharedStore::new(
            StoreBackend::open("memory", None).unwrap(),
            Duration::from_millis(500),
        );
        let metrics = Arc::new(Metrics::default());
        let locations = vec!["Kyamatu".to_string(), "Nzeluni".to_string()];
        (CommitHandler::new(store, metrics.clone(), &locations), metrics)
    }

    fn registration(national_id: &str) -> CommitRequest {
        CommitRequest::Register(RegistrationDraft {
            full_name: "Mary Mwende Kioko".to_string(),
            national_id: national_id.to_string(),
            location: "Nzeluni".to_string(),
            village: "Kwa Ndolo".to_string(),
        })
    }

    #[tokio::test]
    async fn duplicate_national_id_from_second_phone() {
        let (h, metrics) = handler();
        h.commit("+254712345678", registration("12345678"))
            .await
            .unwrap();
        h.commit("+254712345678", registration("12345678"))
            .await
            .unwrap();
        let err = h
            .commit("+254700000001", registration("12345678"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateKey));
        assert_eq!(metrics.snapshot().registrations, 2);
    }

    #[tokio::test]
    async fn registration_outside_allow_list_is_refused() {
        let (h, _) = handler();
        let request = CommitRequest::Register(RegistrationDraft {
            full_name: "Mary Mwende Kioko".to_string(),
            national_id: "12345678".to_string(),
            location: "Elsewhere".to_string(),
            village: "Kwa Ndolo".to_string(),
        });
        assert!(matches!(
            h.commit("+254712345678", request).await,
            Err(EngineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn issue_reply_does_not_wait_for_write() {
        let (h, metrics) = handler();
        let result = h
            .commit(
                "+254712345678",
                CommitRequest::ReportIssue(IssueDraft {
                    category: "Water & Sanitation".to_string(),
                    title: "Water".to_string(),
                    description: "Burst pipe near market".to_string(),
                    location: None,
                }),
            )
            .await
            .unwrap();
        match result {
            CommitResult::Issue(record) => assert!(record.ticket.starts_with("TICK-")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(metrics.snapshot().issues, 1);
    }
}
