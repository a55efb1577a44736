use std::sync::OnceLock;

use regex::Regex;

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
}

pub fn validate_email(email: &str) -> bool {
    email_pattern().is_some_and(|re| re.is_match(email.trim()))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_email("admin@example.com"));
        assert!(validate_email(" jane.smith+eco@city.gov.in "));
        assert!(!validate_email("admin@"));
        assert!(!validate_email("no-at-sign.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn normalizing() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }
}
