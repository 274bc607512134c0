use wardline_contracts::Language;

/// Every string a caller can see. Templates use `{ward}`, `{name}` and `{code}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    FreeService,
    SelectLanguage,
    MainMenu,
    MenuRegister,
    MenuReportIssue,
    MenuApplyBursary,
    MenuNews,
    MenuProjects,
    MenuExit,
    BannerPending,
    BannerRejected,
    InvalidChoice,
    VerificationRequired,
    Back,
    SkipAndSubmit,
    ConfirmOrCancel,

    EnterFullName,
    EnterNationalId,
    SelectLocation,
    EnterVillage,
    InvalidNames,
    InvalidNationalId,
    InvalidLocation,
    InvalidVillage,
    RegistrationReceived,
    DuplicateNationalId,

    SelectIssueCategory,
    IssueRoads,
    IssueWater,
    IssueSecurity,
    IssueHealth,
    IssueOther,
    EnterIssueTitle,
    EnterIssueDescription,
    EnterLandmark,
    InvalidTitle,
    InvalidDescription,
    InvalidLandmark,
    IssueReceived,

    SelectBursaryCategory,
    LevelSecondary,
    LevelCollege,
    LevelUniversity,
    EnterStudentName,
    EnterInstitution,
    EnterAdmissionNumber,
    EnterAmount,
    SelectHousehold,
    HouseholdOrphan,
    HouseholdSingleParent,
    HouseholdVulnerable,
    HouseholdOther,
    EnterGuardianPhone,
    ConfirmApplication,
    InvalidStudentName,
    InvalidInstitution,
    InvalidAdmissionNumber,
    InvalidAmount,
    InvalidPhone,
    InvalidConfirmation,
    ApplicationReceived,

    NewsHeading,
    ProjectsHeading,
    NoNews,
    NoProjects,

    Goodbye,
    InvalidRequest,
    TooManyRequests,
    SessionLimit,
    ServiceUnavailable,
}

pub fn text(language: Language, key: Text) -> &'static str {
    match language {
        Language::En => english(key),
        Language::Sw => swahili(key),
        Language::Ka => kamba(key).unwrap_or_else(|| english(key)),
    }
}

fn english(key: Text) -> &'static str {
    match key {
        Text::FreeService => "{ward} - FREE SERVICE",
        Text::SelectLanguage => "Select Language:",
        Text::MainMenu => "Main Menu:",
        Text::MenuRegister => "Register",
        Text::MenuReportIssue => "Report Issue",
        Text::MenuApplyBursary => "Apply Bursary",
        Text::MenuNews => "News",
        Text::MenuProjects => "Projects",
        Text::MenuExit => "Exit",
        Text::BannerPending => "⏳ Pending Verification",
        Text::BannerRejected => "❌ REJECTED",
        Text::InvalidChoice => "Invalid choice. Try again.",
        Text::VerificationRequired => "Available once your registration is verified.",
        Text::Back => "0. Back",
        Text::SkipAndSubmit => "0. Skip and submit",
        Text::ConfirmOrCancel => "1. Confirm\n0. Cancel",

        Text::EnterFullName => "Enter full name (First Middle Last):",
        Text::EnterNationalId => "Enter your National ID number:",
        Text::SelectLocation => "Select your location:",
        Text::EnterVillage => "Enter your village (3-40 chars):",
        Text::InvalidNames => "Invalid. Enter 3 names (2-30 letters each).",
        Text::InvalidNationalId => "Invalid ID. Use 7-12 digits.",
        Text::InvalidLocation => "Invalid location.",
        Text::InvalidVillage => "Invalid village name.",
        Text::RegistrationReceived => {
            "Thank you {name}! Registration received. Status: pending verification."
        }
        Text::DuplicateNationalId => "This National ID is already registered to another phone.",

        Text::SelectIssueCategory => "Select issue category:",
        Text::IssueRoads => "Roads & Infrastructure",
        Text::IssueWater => "Water & Sanitation",
        Text::IssueSecurity => "Security",
        Text::IssueHealth => "Health Services",
        Text::IssueOther => "Other",
        Text::EnterIssueTitle => "Enter issue title (3-40 chars):",
        Text::EnterIssueDescription => "Describe the issue (5-100 chars):",
        Text::EnterLandmark => "Nearest location/landmark:",
        Text::InvalidTitle => "Title must be 3-40 chars.",
        Text::InvalidDescription => "Description too short (min 5 chars).",
        Text::InvalidLandmark => "Landmark must be 2-60 chars.",
        Text::IssueReceived => "Issue received. Ticket: {code}. We will follow up.",

        Text::SelectBursaryCategory => "Select bursary category:",
        Text::LevelSecondary => "Secondary",
        Text::LevelCollege => "TVET/College",
        Text::LevelUniversity => "University",
        Text::EnterStudentName => "Enter student full name:",
        Text::EnterInstitution => "Enter school/institution:",
        Text::EnterAdmissionNumber => "Enter admission/student number:",
        Text::EnterAmount => "Enter amount needed (KSh):",
        Text::SelectHousehold => "Household status:",
        Text::HouseholdOrphan => "Orphan",
        Text::HouseholdSingleParent => "Single Parent",
        Text::HouseholdVulnerable => "Vulnerable",
        Text::HouseholdOther => "Other",
        Text::EnterGuardianPhone => "Guardian/Parent phone (07xxxxxxxx):",
        Text::ConfirmApplication => "Confirm application:",
        Text::InvalidStudentName => "Name too short (min 3 letters).",
        Text::InvalidInstitution => "Institution must be 3-60 chars.",
        Text::InvalidAdmissionNumber => "Invalid admission number.",
        Text::InvalidAmount => "Invalid amount. Enter numbers only (500-100000).",
        Text::InvalidPhone => "Invalid phone number.",
        Text::InvalidConfirmation => "Reply 1 to confirm or 0 to cancel.",
        Text::ApplicationReceived => "Application received. Ref: {code}. We will contact you.",

        Text::NewsHeading => "News:",
        Text::ProjectsHeading => "Projects:",
        Text::NoNews => "No announcements right now.",
        Text::NoProjects => "No projects to show.",

        Text::Goodbye => "Thank you. Goodbye.",
        Text::InvalidRequest => "Invalid request.",
        Text::TooManyRequests => "Too many requests. Please try again later.",
        Text::SessionLimit => "Session limit reached. Please start a new session.",
        Text::ServiceUnavailable => "Service temporarily unavailable. Please try again later.",
    }
}

fn swahili(key: Text) -> &'static str {
    match key {
        Text::FreeService => "{ward} - HUDUMA BURE",
        Text::SelectLanguage => "Chagua Lugha:",
        Text::MainMenu => "Menyu Kuu:",
        Text::MenuRegister => "Sajili",
        Text::MenuReportIssue => "Ripoti Tatizo",
        Text::MenuApplyBursary => "Omba Bursary",
        Text::MenuNews => "Habari",
        Text::MenuProjects => "Miradi",
        Text::MenuExit => "Toka",
        Text::BannerPending => "⏳ Inasubiri Uthibitisho",
        Text::BannerRejected => "❌ IMEKATALIWA",
        Text::InvalidChoice => "Chaguo si sahihi. Jaribu tena.",
        Text::VerificationRequired => "Inapatikana baada ya usajili kuthibitishwa.",
        Text::Back => "0. Rudi",
        Text::SkipAndSubmit => "0. Ruka na utume",
        Text::ConfirmOrCancel => "1. Thibitisha\n0. Ghairi",

        Text::EnterFullName => "Ingiza majina matatu (Kwanza Kati Mwisho):",
        Text::EnterNationalId => "Ingiza nambari ya kitambulisho:",
        Text::SelectLocation => "Chagua eneo lako:",
        Text::EnterVillage => "Ingiza kijiji chako (herufi 3-40):",
        Text::InvalidNames => "Si sahihi. Ingiza majina 3 (herufi 2-30 kila moja).",
        Text::InvalidNationalId => "Kitambulisho si sahihi. Tumia tarakimu 7-12.",
        Text::InvalidLocation => "Eneo si sahihi.",
        Text::InvalidVillage => "Jina la kijiji si sahihi.",
        Text::RegistrationReceived => {
            "Asante {name}! Usajili umepokelewa. Hali: inasubiri uthibitisho."
        }
        Text::DuplicateNationalId => "Kitambulisho hiki kimesajiliwa na simu nyingine.",

        Text::SelectIssueCategory => "Chagua aina ya tatizo:",
        Text::IssueRoads => "Barabara",
        Text::IssueWater => "Maji na Usafi",
        Text::IssueSecurity => "Usalama",
        Text::IssueHealth => "Afya",
        Text::IssueOther => "Mengineyo",
        Text::EnterIssueTitle => "Ingiza kichwa cha tatizo (herufi 3-40):",
        Text::EnterIssueDescription => "Eleza tatizo (herufi 5-100):",
        Text::EnterLandmark => "Mahali/alama ya karibu:",
        Text::InvalidTitle => "Kichwa kiwe herufi 3-40.",
        Text::InvalidDescription => "Maelezo ni mafupi mno (angalau herufi 5).",
        Text::InvalidLandmark => "Alama iwe herufi 2-60.",
        Text::IssueReceived => "Tatizo limepokelewa. Tiketi: {code}. Tutafuatilia.",

        Text::SelectBursaryCategory => "Chagua aina ya bursary:",
        Text::LevelSecondary => "Sekondari",
        Text::LevelCollege => "TVET/Chuo",
        Text::LevelUniversity => "Chuo Kikuu",
        Text::EnterStudentName => "Ingiza jina kamili la mwanafunzi:",
        Text::EnterInstitution => "Ingiza shule/taasisi:",
        Text::EnterAdmissionNumber => "Ingiza nambari ya usajili wa mwanafunzi:",
        Text::EnterAmount => "Ingiza kiasi kinachohitajika (KSh):",
        Text::SelectHousehold => "Hali ya familia:",
        Text::HouseholdOrphan => "Yatima",
        Text::HouseholdSingleParent => "Mzazi Mmoja",
        Text::HouseholdVulnerable => "Hali Duni",
        Text::HouseholdOther => "Nyingine",
        Text::EnterGuardianPhone => "Simu ya mzazi/mlezi (07xxxxxxxx):",
        Text::ConfirmApplication => "Thibitisha ombi:",
        Text::InvalidStudentName => "Jina ni fupi mno (angalau herufi 3).",
        Text::InvalidInstitution => "Taasisi iwe herufi 3-60.",
        Text::InvalidAdmissionNumber => "Nambari ya usajili si sahihi.",
        Text::InvalidAmount => "Kiasi si sahihi. Tumia tarakimu pekee (500-100000).",
        Text::InvalidPhone => "Nambari ya simu si sahihi.",
        Text::InvalidConfirmation => "Jibu 1 kuthibitisha au 0 kughairi.",
        Text::ApplicationReceived => "Ombi limepokelewa. Kumb: {code}. Tutawasiliana nawe.",

        Text::NewsHeading => "Habari:",
        Text::ProjectsHeading => "Miradi:",
        Text::NoNews => "Hakuna matangazo kwa sasa.",
        Text::NoProjects => "Hakuna miradi ya kuonyesha.",

        Text::Goodbye => "Asante. Kwaheri.",
        Text::InvalidRequest => "Ombi si sahihi.",
        Text::TooManyRequests => "Maombi mengi mno. Jaribu tena baadaye.",
        Text::SessionLimit => "Kikomo cha kikao kimefikiwa. Anza kikao kipya.",
        Text::ServiceUnavailable => "Huduma haipatikani kwa sasa. Jaribu tena baadaye.",
    }
}

/// Partial catalog; anything missing falls back to English.
fn kamba(key: Text) -> Option<&'static str> {
    let value = match key {
        Text::SelectLanguage => "Sakua Kithyomo:",
        Text::MainMenu => "Menyu Ikalyo:",
        Text::MenuRegister => "Kwi kyandikya",
        Text::MenuNews => "Yivaitwo",
        Text::MenuProjects => "Mivinda",
        Text::MenuExit => "Kûuma",
        Text::InvalidChoice => "Kîsuû kivîa.",
        Text::Goodbye => "Tûsindane.",
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kamba_falls_back_to_english() {
        assert_eq!(text(Language::Ka, Text::MainMenu), "Menyu Ikalyo:");
        assert_eq!(
            text(Language::Ka, Text::EnterAmount),
            text(Language::En, Text::EnterAmount)
        );
    }

    #[test]
    fn swahili_differs_from_english() {
        assert_ne!(
            text(Language::Sw, Text::MainMenu),
            text(Language::En, Text::MainMenu)
        );
    }
}
