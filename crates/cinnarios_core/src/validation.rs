//! crates/cinnarios_core/src/validation.rs
//!
//! Credential checks shared by the login and sign-up flows.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// True for `something@domain.tld` shaped input.
pub fn is_well_formed_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    pub fn label(self) -> &'static str {
        match self {
            PasswordStrength::Weak => "Weak password",
            PasswordStrength::Medium => "Medium strength password",
            PasswordStrength::Strong => "Strong password",
        }
    }
}

/// Scores a password one point each for length >= 8, a lowercase letter, an
/// uppercase letter, a digit and any other character.
pub fn password_strength(password: &str) -> PasswordStrength {
    let checks = [
        password.chars().count() >= 8,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = checks.iter().filter(|passed| **passed).count();

    match score {
        0..=2 => PasswordStrength::Weak,
        3 => PasswordStrength::Medium,
        _ => PasswordStrength::Strong,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(is_well_formed_email("demo@cinnarios.com"));
        assert!(is_well_formed_email("  a.b@c.io "));
        assert!(!is_well_formed_email("demo"));
        assert!(!is_well_formed_email("demo@localhost"));
        assert!(!is_well_formed_email("de mo@cinnarios.com"));
        assert!(!is_well_formed_email(""));
    }

    #[test]
    fn test_password_strength_scoring() {
        assert_eq!(password_strength(""), PasswordStrength::Weak);
        assert_eq!(password_strength("password"), PasswordStrength::Weak);
        // length + lowercase + digit
        assert_eq!(password_strength("password123"), PasswordStrength::Medium);
        assert_eq!(password_strength("Password123"), PasswordStrength::Strong);
        assert_eq!(password_strength("Pa1!"), PasswordStrength::Strong);
    }
}
