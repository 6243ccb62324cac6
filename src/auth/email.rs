use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Canonical form of an email address: trimmed, with the domain portion
/// lower-cased. The local part is case-sensitive per RFC 5321, so it is
/// left untouched. Blank input is rejected.
pub(crate) fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::validation("email", "This field may not be blank"));
    }
    match email.rsplit_once('@') {
        Some((local, domain)) => Ok(format!("{}@{}", local, domain.to_lowercase())),
        None => Ok(email.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("cook@example.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com "));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn normalize_lowercases_domain_only() {
        let got = normalize_email("Chef.Remy@EXAMPLE.Com").unwrap();
        assert_eq!(got, "Chef.Remy@example.com");
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(
            normalize_email("  cook@example.com ").unwrap(),
            "cook@example.com"
        );
    }

    #[test]
    fn normalize_rejects_blank() {
        assert!(normalize_email("").is_err());
        assert!(normalize_email("   ").is_err());
    }
}
