use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const CODE_LEN: usize = 10;

pub const TICKET_PREFIX: &str = "TICK-";
pub const APPLICATION_PREFIX: &str = "BUR-";

/// Uppercase alphanumeric code from the thread-local CSPRNG.
pub fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn ticket_code() -> String {
    format!("{TICKET_PREFIX}{}", random_code(CODE_LEN))
}

pub fn application_number() -> String {
    format!("{APPLICATION_PREFIX}{}", random_code(CODE_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;

    #[test]
    fn ticket_matches_published_pattern() {
        let pattern = Regex::new(r"^TICK-[A-Z0-9]{6,10}$").unwrap();
        for _ in 0..100 {
            assert!(pattern.is_match(&ticket_code()));
        }
        assert!(Regex::new(r"^BUR-[A-Z0-9]{10}$")
            .unwrap()
            .is_match(&application_number()));
    }

    #[test]
    fn ten_thousand_concurrent_tickets_are_unique() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..1250).map(|_| ticket_code()).collect::<Vec<_>>()))
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for code in handle.join().unwrap() {
                assert!(seen.insert(code), "duplicate ticket generated");
            }
        }
        assert_eq!(seen.len(), 10_000);
    }
}
