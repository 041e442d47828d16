//! Email helpers for the submission stage.

use regex::Regex;

/// Normalize an email before validation and display.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic `local@domain.tld` shape check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^\S+@\S+\.\S+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Alice@Example.COM \n"), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@b.com"));
        assert!(valid_email("name.surname@example.co"));
        assert!(valid_email("first+tag@sub.domain.io"));
    }

    #[test]
    fn valid_email_rejects_malformed() {
        assert!(!valid_email(""));
        assert!(!valid_email("plainaddress"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("user@localhost"));
        assert!(!valid_email("user @example.com"));
    }
}
