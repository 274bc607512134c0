use wardline_contracts::Language;

use crate::flows::{FlowId, StepContext};
use crate::text::Text;
use crate::validate::{self, Rejection};

/// Side effect requested by a completed flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitRequest {
    Register(RegistrationDraft),
    ReportIssue(IssueDraft),
    ApplyBursary(BursaryDraft),
}

impl CommitRequest {
    pub fn flow(&self) -> FlowId {
        match self {
            CommitRequest::Register(_) => FlowId::Register,
            CommitRequest::ReportIssue(_) => FlowId::ReportIssue,
            CommitRequest::ApplyBursary(_) => FlowId::ApplyBursary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub full_name: String,
    pub national_id: String,
    pub location: String,
    pub village: String,
}

impl RegistrationDraft {
    pub fn from_values(values: &[String]) -> Option<Self> {
        match values {
            [full_name, national_id, location, village] => Some(Self {
                full_name: full_name.clone(),
                national_id: national_id.clone(),
                location: location.clone(),
                village: village.clone(),
            }),
            _ => None,
        }
    }

    /// Re-checks the whole record before it is written.
    pub fn check(&self, locations: &[String]) -> Result<(), Rejection> {
        let ctx = StepContext {
            language: Language::En,
            locations,
            listing: &[],
            country_code: "",
        };
        validate::full_name(&self.full_name, &ctx)?;
        validate::national_id(&self.national_id, &ctx)?;
        validate::village(&self.village, &ctx)?;
        if !locations.iter().any(|l| l == &self.location) {
            return Err(Rejection(Text::InvalidLocation));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub category: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
}

impl IssueDraft {
    pub fn from_values(values: &[String]) -> Option<Self> {
        match values {
            [category, title, description, landmark] => Some(Self {
                category: category.clone(),
                title: title.clone(),
                description: description.chars().take(validate::DESCRIPTION_MAX).collect(),
                location: (!landmark.is_empty()).then(|| landmark.clone()),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BursaryDraft {
    pub category: String,
    pub student_name: String,
    pub institution: String,
    pub admission_number: String,
    pub amount: u64,
    pub household_status: String,
    pub guardian_phone: String,
}

impl BursaryDraft {
    /// The trailing confirmation value is not part of the application.
    pub fn from_values(values: &[String]) -> Option<Self> {
        match values {
            [category, student_name, institution, admission_number, amount, household_status, guardian_phone, _confirm] => {
                Some(Self {
                    category: category.clone(),
                    student_name: student_name.clone(),
                    institution: institution.clone(),
                    admission_number: admission_number.clone(),
                    amount: amount.parse().ok()?,
                    household_status: household_status.clone(),
                    guardian_phone: guardian_phone.clone(),
                })
            }
            _ => None,
        }
    }
}
