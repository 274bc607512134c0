use serde::{Deserialize, Serialize};

/// Canonical form of one gateway callback, whatever vendor sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub session_id: String,
    /// E.164, e.g. `+254712345678`.
    pub phone_number: String,
    pub service_code: String,
    /// Accumulated `*`-delimited input history; empty on a fresh session.
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Sw,
    Ka,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Sw, Language::Ka];

    pub fn from_selector(token: &str) -> Option<Self> {
        match token.trim() {
            "1" => Some(Language::En),
            "2" => Some(Language::Sw),
            "3" => Some(Language::Ka),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Sw => "sw",
            Language::Ka => "ka",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(VerificationStatus::Pending),
            "verified" | "approved" => Some(VerificationStatus::Verified),
            "rejected" => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }
}

/// How the main menu classifies a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerClass {
    Unregistered,
    Pending,
    Verified,
    Rejected,
}

impl CallerClass {
    pub fn from_status(status: Option<VerificationStatus>) -> Self {
        match status {
            None => CallerClass::Unregistered,
            Some(VerificationStatus::Pending) => CallerClass::Pending,
            Some(VerificationStatus::Verified) => CallerClass::Verified,
            Some(VerificationStatus::Rejected) => CallerClass::Rejected,
        }
    }
}

/// Result of a registration lookup by phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub phone_number: String,
    pub national_id: Option<String>,
    pub status: VerificationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub id: String,
    pub phone_number: String,
    pub full_name: String,
    pub national_id: String,
    pub location: String,
    pub village: String,
    pub status: VerificationStatus,
    pub source: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueRecord {
    pub id: String,
    pub ticket: String,
    pub phone_number: String,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BursaryApplicationRecord {
    pub id: String,
    pub application_number: String,
    pub phone_number: String,
    pub category: String,
    pub student_name: String,
    pub institution: String,
    pub admission_number: String,
    pub amount: u64,
    pub household_status: String,
    pub guardian_phone: String,
    pub status: String,
    pub created_at: String,
}

/// What a terminal step produced once its side effect went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    Registration(RegistrationRecord),
    Issue(IssueRecord),
    BursaryApplication(BursaryApplicationRecord),
}

/// One announcement or project as shown on a handset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListItem {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub malformed: u64,
    pub rate_limited: u64,
    pub registrations: u64,
    pub issues: u64,
    pub issue_write_failures: u64,
    pub applications: u64,
}
