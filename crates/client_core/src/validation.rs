use std::sync::LazyLock;

use regex::Regex;
use shared::error::FieldError;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(FieldError::InvalidEmail)
    }
}

/// Parses the quantity field. Only whole numbers `>= 1` are accepted.
pub fn parse_quantity(raw: &str) -> Result<u32, FieldError> {
    match raw.trim().parse::<u32>() {
        Ok(quantity) if quantity >= 1 => Ok(quantity),
        _ => Err(FieldError::InvalidQuantity),
    }
}

/// True when the email's domain is one that cannot receive the verification
/// mail. Matching is case-insensitive on the part after `@`.
pub fn is_unsupported_domain(email: &str, domains: &[String]) -> bool {
    let Some((_, domain)) = email.trim().rsplit_once('@') else {
        return false;
    };
    domains
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_basic_addresses() {
        for email in ["a@b.com", "first.last@lab.example.org", "x+tag@host.io"] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in [
            "",
            "plain",
            "a@b",
            "@b.com",
            "a@.",
            "a b@c.com",
            "a@b@c.com",
            " a@b.com",
        ] {
            assert_eq!(validate_email(email), Err(FieldError::InvalidEmail), "{email:?}");
        }
    }

    #[test]
    fn quantity_must_be_positive_integer() {
        assert_eq!(parse_quantity("3"), Ok(3));
        assert_eq!(parse_quantity(" 12 "), Ok(12));
        for raw in ["0", "-1", "", "1.5", "abc"] {
            assert_eq!(parse_quantity(raw), Err(FieldError::InvalidQuantity), "{raw:?}");
        }
    }

    #[test]
    fn unsupported_domain_match_is_case_insensitive() {
        let domains = vec!["yahoo.com".to_string(), "yahoo.fr".to_string()];
        assert!(is_unsupported_domain("someone@Yahoo.FR", &domains));
        assert!(!is_unsupported_domain("someone@gmail.com", &domains));
        assert!(!is_unsupported_domain("no-at-sign", &domains));
    }
}
