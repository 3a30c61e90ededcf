//! Input validation helpers
//!
//! Structural checks shared by command validation. Each command maps a
//! failed check to its own typed error variant, so these return plain
//! booleans rather than error values.

/// True when the trimmed value is non-empty and at most `max` bytes long.
pub fn validate_length(value: &str, max: usize) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && value.len() <= max
}

/// True when the value is one of the allowed tokens.
pub fn validate_one_of(value: &str, allowed: &[&str]) -> bool {
    allowed.contains(&value)
}

/// Structural email check: one `@` with non-empty local part and a dotted
/// domain. Deliverability is not our problem.
pub fn validate_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_length() {
        assert!(validate_length("ok", 10));
        assert!(!validate_length("", 10));
        assert!(!validate_length("   ", 10));
        assert!(!validate_length("too long", 4));
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("routine", &["stat", "urgent", "routine"]));
        assert!(!validate_one_of("later", &["stat", "urgent", "routine"]));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("tech@lab.example.org"));
        assert!(!validate_email("no-at-sign"));
        assert!(!validate_email("@lab.example.org"));
        assert!(!validate_email("tech@nodot"));
        assert!(!validate_email("tech@.org"));
        assert!(!validate_email("te ch@lab.org"));
    }
}
