use once_cell::sync::Lazy;
use regex::Regex;

use crate::flows::StepContext;
use crate::phone::normalize_phone;
use crate::text::Text;

/// A step refused the caller's input; carries the localized reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection(pub Text);

pub type Validated = Result<String, Rejection>;

pub const ISSUE_CATEGORIES: [(&str, Text); 5] = [
    ("Roads & Infrastructure", Text::IssueRoads),
    ("Water & Sanitation", Text::IssueWater),
    ("Security", Text::IssueSecurity),
    ("Health Services", Text::IssueHealth),
    ("Other", Text::IssueOther),
];

pub const BURSARY_LEVELS: [(&str, Text); 3] = [
    ("Secondary", Text::LevelSecondary),
    ("TVET/College", Text::LevelCollege),
    ("University", Text::LevelUniversity),
];

pub const HOUSEHOLD_STATUSES: [(&str, Text); 4] = [
    ("Orphan", Text::HouseholdOrphan),
    ("Single Parent", Text::HouseholdSingleParent),
    ("Vulnerable", Text::HouseholdVulnerable),
    ("Other", Text::HouseholdOther),
];

pub const DESCRIPTION_MAX: usize = 100;
pub const AMOUNT_MIN: u64 = 500;
pub const AMOUNT_MAX: u64 = 100_000;

static NAME_PART: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z'\-]{2,30}$").unwrap());
static NATIONAL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{7,12}$").unwrap());
static VILLAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9 '\-]{3,40}$").unwrap());
static PERSON_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z '\-]{3,60}$").unwrap());
static ADMISSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9/\-]{1,20}$").unwrap());

/// Collapses runs of whitespace to single spaces.
pub fn clean(token: &str) -> String {
    token.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 1-based menu pick to 0-based index.
pub fn pick(token: &str, options: usize) -> Option<usize> {
    let n: usize = token.trim().parse().ok()?;
    (1..=options).contains(&n).then(|| n - 1)
}

pub fn full_name(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let name = clean(token);
    let parts: Vec<&str> = name.split(' ').collect();
    if parts.len() == 3 && parts.iter().all(|p| NAME_PART.is_match(p)) {
        Ok(name)
    } else {
        Err(Rejection(Text::InvalidNames))
    }
}

pub fn national_id(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let id = token.trim();
    if NATIONAL_ID.is_match(id) {
        Ok(id.to_string())
    } else {
        Err(Rejection(Text::InvalidNationalId))
    }
}

pub fn ward_location(token: &str, ctx: &StepContext<'_>) -> Validated {
    pick(token, ctx.locations.len())
        .map(|i| ctx.locations[i].clone())
        .ok_or(Rejection(Text::InvalidLocation))
}

pub fn village(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let v = clean(token);
    if VILLAGE.is_match(&v) {
        Ok(v)
    } else {
        Err(Rejection(Text::InvalidVillage))
    }
}

pub fn issue_category(token: &str, _ctx: &StepContext<'_>) -> Validated {
    pick(token, ISSUE_CATEGORIES.len())
        .map(|i| ISSUE_CATEGORIES[i].0.to_string())
        .ok_or(Rejection(Text::InvalidChoice))
}

pub fn issue_title(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let title = clean(token);
    if (3..=40).contains(&title.chars().count()) {
        Ok(title)
    } else {
        Err(Rejection(Text::InvalidTitle))
    }
}

/// Over-long descriptions are cut to fit rather than refused.
pub fn issue_description(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let description = clean(token);
    if description.chars().count() < 5 {
        return Err(Rejection(Text::InvalidDescription));
    }
    Ok(description.chars().take(DESCRIPTION_MAX).collect())
}

/// `0` skips; the empty value means "no landmark".
pub fn landmark(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let landmark = clean(token);
    if landmark == "0" {
        return Ok(String::new());
    }
    if (2..=60).contains(&landmark.chars().count()) {
        Ok(landmark)
    } else {
        Err(Rejection(Text::InvalidLandmark))
    }
}

pub fn bursary_level(token: &str, _ctx: &StepContext<'_>) -> Validated {
    pick(token, BURSARY_LEVELS.len())
        .map(|i| BURSARY_LEVELS[i].0.to_string())
        .ok_or(Rejection(Text::InvalidChoice))
}

pub fn student_name(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let name = clean(token);
    if PERSON_NAME.is_match(&name) {
        Ok(name)
    } else {
        Err(Rejection(Text::InvalidStudentName))
    }
}

pub fn institution(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let name = clean(token);
    if (3..=60).contains(&name.chars().count()) {
        Ok(name)
    } else {
        Err(Rejection(Text::InvalidInstitution))
    }
}

pub fn admission_number(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let value = token.trim();
    if ADMISSION.is_match(value) {
        Ok(value.to_uppercase())
    } else {
        Err(Rejection(Text::InvalidAdmissionNumber))
    }
}

pub fn amount(token: &str, _ctx: &StepContext<'_>) -> Validated {
    let value = token.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(Rejection(Text::InvalidAmount));
    }
    match value.parse::<u64>() {
        Ok(n) if (AMOUNT_MIN..=AMOUNT_MAX).contains(&n) => Ok(n.to_string()),
        _ => Err(Rejection(Text::InvalidAmount)),
    }
}

pub fn household(token: &str, _ctx: &StepContext<'_>) -> Validated {
    pick(token, HOUSEHOLD_STATUSES.len())
        .map(|i| HOUSEHOLD_STATUSES[i].0.to_string())
        .ok_or(Rejection(Text::InvalidChoice))
}

pub fn guardian_phone(token: &str, ctx: &StepContext<'_>) -> Validated {
    normalize_phone(token, ctx.country_code)
        .filter(|p| p.len() >= 11)
        .ok_or(Rejection(Text::InvalidPhone))
}

pub fn confirmation(token: &str, _ctx: &StepContext<'_>) -> Validated {
    if token.trim() == "1" {
        Ok("confirmed".to_string())
    } else {
        Err(Rejection(Text::InvalidConfirmation))
    }
}

pub fn listing_choice(token: &str, ctx: &StepContext<'_>) -> Validated {
    pick(token, ctx.listing.len())
        .map(|i| i.to_string())
        .ok_or(Rejection(Text::InvalidChoice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardline_contracts::{Language, ListItem};

    fn ctx<'a>(locations: &'a [String], listing: &'a [ListItem]) -> StepContext<'a> {
        StepContext {
            language: Language::En,
            locations,
            listing,
            country_code: "254",
        }
    }

    #[test]
    fn full_name_needs_exactly_three_parts() {
        let c = ctx(&[], &[]);
        assert_eq!(
            full_name("  Mary  Mwende   O'Neil ", &c),
            Ok("Mary Mwende O'Neil".to_string())
        );
        assert!(full_name("Mary Mwende", &c).is_err());
        assert!(full_name("Mary Mwende Kioko Musyoka", &c).is_err());
        assert!(full_name("Mary M Kioko", &c).is_err());
        assert!(full_name("Mary Mw3nde Kioko", &c).is_err());
    }

    #[test]
    fn national_id_is_seven_to_twelve_digits() {
        let c = ctx(&[], &[]);
        assert!(national_id("1234567", &c).is_ok());
        assert!(national_id("123456789012", &c).is_ok());
        assert!(national_id("123456", &c).is_err());
        assert!(national_id("1234567890123", &c).is_err());
        assert!(national_id("12345a78", &c).is_err());
    }

    #[test]
    fn location_must_come_from_allow_list() {
        let locations = vec!["Kyamatu".to_string(), "Nzeluni".to_string()];
        let c = ctx(&locations, &[]);
        assert_eq!(ward_location("2", &c), Ok("Nzeluni".to_string()));
        assert_eq!(
            ward_location("3", &c),
            Err(Rejection(Text::InvalidLocation))
        );
        assert!(ward_location("Nzeluni", &c).is_err());
    }

    #[test]
    fn description_is_truncated_not_refused() {
        let c = ctx(&[], &[]);
        let long = "x".repeat(150);
        assert_eq!(issue_description(&long, &c).unwrap().len(), DESCRIPTION_MAX);
        assert!(issue_description("leak", &c).is_err());
    }

    #[test]
    fn landmark_zero_means_skip() {
        let c = ctx(&[], &[]);
        assert_eq!(landmark("0", &c), Ok(String::new()));
        assert_eq!(landmark("Market", &c), Ok("Market".to_string()));
    }

    #[test]
    fn amount_is_numeric_and_bounded() {
        let c = ctx(&[], &[]);
        assert_eq!(amount("15000", &c), Ok("15000".to_string()));
        assert_eq!(amount("abc", &c), Err(Rejection(Text::InvalidAmount)));
        assert_eq!(amount("15,000", &c), Err(Rejection(Text::InvalidAmount)));
        assert_eq!(amount("100", &c), Err(Rejection(Text::InvalidAmount)));
    }

    #[test]
    fn guardian_phone_is_normalized() {
        let c = ctx(&[], &[]);
        assert_eq!(
            guardian_phone("0722000111", &c),
            Ok("+254722000111".to_string())
        );
        assert!(guardian_phone("12", &c).is_err());
    }

    #[test]
    fn pick_is_one_based() {
        assert_eq!(pick("1", 3), Some(0));
        assert_eq!(pick("3", 3), Some(2));
        assert_eq!(pick("0", 3), None);
        assert_eq!(pick("4", 3), None);
        assert_eq!(pick("x", 3), None);
    }
}
