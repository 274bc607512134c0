/// Normalizes a subscriber number to E.164 using `country_code` for local
/// forms (`07…`, `7…`). Returns `None` when too few or too many digits remain.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 || digits.len() > 15 {
        return None;
    }

    let national_len = 9;
    let normalized = if digits.starts_with(country_code)
        && digits.len() == country_code.len() + national_len
    {
        format!("+{digits}")
    } else if digits.starts_with('0') && digits.len() == national_len + 1 {
        format!("+{country_code}{}", &digits[1..])
    } else if digits.len() == national_len && (digits.starts_with('7') || digits.starts_with('1'))
    {
        format!("+{country_code}{digits}")
    } else {
        format!("+{digits}")
    };
    Some(normalized)
}

/// Log-safe rendering of a phone number: `+254***678`.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 7 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{head}***{tail}")
}
