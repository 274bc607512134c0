use wardline_contracts::{Language, ListItem};

use crate::render::truncate;
use crate::text::{text, Text};
use crate::validate::{self, Validated, BURSARY_LEVELS, HOUSEHOLD_STATUSES, ISSUE_CATEGORIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowId {
    Register,
    ReportIssue,
    ApplyBursary,
    ViewNews,
    ViewProjects,
    Exit,
}

impl FlowId {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowId::Register => "register",
            FlowId::ReportIssue => "report_issue",
            FlowId::ApplyBursary => "apply_bursary",
            FlowId::ViewNews => "view_news",
            FlowId::ViewProjects => "view_projects",
            FlowId::Exit => "exit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Announcements,
    Projects,
}

/// What a step needs to build its prompt and judge an answer.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub language: Language,
    pub locations: &'a [String],
    /// Items of the flow's listing, empty for flows without one.
    pub listing: &'a [ListItem],
    pub country_code: &'a str,
}

pub type ValidateFn = fn(&str, &StepContext<'_>) -> Validated;

/// How a step's question is put to the caller.
#[derive(Debug, Clone, Copy)]
pub enum Prompt {
    Plain(Text),
    Choices(Text, &'static [(&'static str, Text)]),
    Locations,
    Listing(Text),
    ConfirmBursary,
}

impl Prompt {
    pub fn build(&self, ctx: &StepContext<'_>, values: &[String]) -> String {
        match *self {
            Prompt::Plain(key) => text(ctx.language, key).to_string(),
            Prompt::Choices(heading, options) => {
                let labels = options.iter().map(|(_, label)| text(ctx.language, *label));
                numbered(text(ctx.language, heading), labels)
            }
            Prompt::Locations => numbered(
                text(ctx.language, Text::SelectLocation),
                ctx.locations.iter().map(String::as_str),
            ),
            Prompt::Listing(heading) => numbered(
                text(ctx.language, heading),
                ctx.listing.iter().map(|item| item.title.as_str()),
            ),
            Prompt::ConfirmBursary => confirm_summary(ctx, values),
        }
    }
}

pub struct Step {
    pub field: &'static str,
    pub prompt: Prompt,
    pub validate: ValidateFn,
    /// Accepts `0` as an answer instead of treating it as Back.
    pub skippable: bool,
    /// Line appended under the prompt (`0. Back`, `0. Cancel`, ...).
    pub footer: Option<Text>,
}

pub struct Flow {
    pub id: FlowId,
    pub selector: &'static str,
    pub label: Text,
    pub steps: &'static [Step],
    pub listing: Option<ListingKind>,
    /// Hidden from unverified callers when the menu gate is on.
    pub needs_verification: bool,
}

impl Flow {
    pub fn is_terminal(&self, index: usize) -> bool {
        index + 1 == self.steps.len()
    }
}

const fn step(field: &'static str, prompt: Prompt, validate: ValidateFn) -> Step {
    Step {
        field,
        prompt,
        validate,
        skippable: false,
        footer: Some(Text::Back),
    }
}

static REGISTER_STEPS: [Step; 4] = [
    step("full_name", Prompt::Plain(Text::EnterFullName), validate::full_name),
    step("national_id", Prompt::Plain(Text::EnterNationalId), validate::national_id),
    step("location", Prompt::Locations, validate::ward_location),
    step("village", Prompt::Plain(Text::EnterVillage), validate::village),
];

static REPORT_ISSUE_STEPS: [Step; 4] = [
    step(
        "category",
        Prompt::Choices(Text::SelectIssueCategory, &ISSUE_CATEGORIES),
        validate::issue_category,
    ),
    step("title", Prompt::Plain(Text::EnterIssueTitle), validate::issue_title),
    step(
        "description",
        Prompt::Plain(Text::EnterIssueDescription),
        validate::issue_description,
    ),
    Step {
        field: "landmark",
        prompt: Prompt::Plain(Text::EnterLandmark),
        validate: validate::landmark,
        skippable: true,
        footer: Some(Text::SkipAndSubmit),
    },
];

static APPLY_BURSARY_STEPS: [Step; 8] = [
    step(
        "category",
        Prompt::Choices(Text::SelectBursaryCategory, &BURSARY_LEVELS),
        validate::bursary_level,
    ),
    step("student_name", Prompt::Plain(Text::EnterStudentName), validate::student_name),
    step("institution", Prompt::Plain(Text::EnterInstitution), validate::institution),
    step(
        "admission_number",
        Prompt::Plain(Text::EnterAdmissionNumber),
        validate::admission_number,
    ),
    step("amount", Prompt::Plain(Text::EnterAmount), validate::amount),
    step(
        "household_status",
        Prompt::Choices(Text::SelectHousehold, &HOUSEHOLD_STATUSES),
        validate::household,
    ),
    step(
        "guardian_phone",
        Prompt::Plain(Text::EnterGuardianPhone),
        validate::guardian_phone,
    ),
    Step {
        field: "confirm",
        prompt: Prompt::ConfirmBursary,
        validate: validate::confirmation,
        skippable: false,
        footer: Some(Text::ConfirmOrCancel),
    },
];

static NEWS_STEPS: [Step; 1] = [step(
    "item",
    Prompt::Listing(Text::NewsHeading),
    validate::listing_choice,
)];

static PROJECT_STEPS: [Step; 1] = [step(
    "item",
    Prompt::Listing(Text::ProjectsHeading),
    validate::listing_choice,
)];

/// Main-menu entries in display order.
pub static REGISTRY: [Flow; 6] = [
    Flow {
        id: FlowId::Register,
        selector: "1",
        label: Text::MenuRegister,
        steps: &REGISTER_STEPS,
        listing: None,
        needs_verification: false,
    },
    Flow {
        id: FlowId::ReportIssue,
        selector: "2",
        label: Text::MenuReportIssue,
        steps: &REPORT_ISSUE_STEPS,
        listing: None,
        needs_verification: true,
    },
    Flow {
        id: FlowId::ApplyBursary,
        selector: "3",
        label: Text::MenuApplyBursary,
        steps: &APPLY_BURSARY_STEPS,
        listing: None,
        needs_verification: true,
    },
    Flow {
        id: FlowId::ViewNews,
        selector: "4",
        label: Text::MenuNews,
        steps: &NEWS_STEPS,
        listing: Some(ListingKind::Announcements),
        needs_verification: false,
    },
    Flow {
        id: FlowId::ViewProjects,
        selector: "5",
        label: Text::MenuProjects,
        steps: &PROJECT_STEPS,
        listing: Some(ListingKind::Projects),
        needs_verification: false,
    },
    Flow {
        id: FlowId::Exit,
        selector: "0",
        label: Text::MenuExit,
        steps: &[],
        listing: None,
        needs_verification: false,
    },
];

pub fn by_selector(token: &str) -> Option<&'static Flow> {
    REGISTRY.iter().find(|f| f.selector == token.trim())
}

pub fn by_id(id: FlowId) -> &'static Flow {
    REGISTRY
        .iter()
        .find(|f| f.id == id)
        .unwrap_or(&REGISTRY[REGISTRY.len() - 1])
}

fn numbered<'a>(heading: &str, options: impl Iterator<Item = &'a str>) -> String {
    let mut out = heading.to_string();
    for (i, option) in options.enumerate() {
        out.push_str(&format!("\n{}. {option}", i + 1));
    }
    out
}

const SUMMARY_FIELD_CHARS: usize = 28;

fn confirm_summary(ctx: &StepContext<'_>, values: &[String]) -> String {
    let value = |i: usize| values.get(i).map(String::as_str).unwrap_or("-");
    format!(
        "{}\n{} ({})\n{}\nKSh {}\n{}",
        text(ctx.language, Text::ConfirmApplication),
        truncate(value(1), SUMMARY_FIELD_CHARS),
        value(0),
        truncate(value(2), SUMMARY_FIELD_CHARS),
        value(4),
        value(6),
    )
}
