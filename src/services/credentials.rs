//! Password strength and email format rules applied before a user is written.
//!
//! Every rule is evaluated so the caller gets the full list of messages for the
//! offending fields, not just the first failure.

use std::sync::LazyLock;

use regex::Regex;

pub const PASSWORD_MIN_LENGTH: usize = 7;

/// Characters accepted as the required password symbol.
pub const PASSWORD_SYMBOLS: &[char] = &['!', '@', '#', '$', '&', '*'];

pub const EMAIL_BLANK: &str = "Email can't be blank";
pub const EMAIL_INVALID: &str = "Email must be a valid email address";
pub const EMAIL_TAKEN: &str = "Email has already been taken";
pub const PASSWORD_BLANK: &str = "Password can't be blank";
pub const PASSWORD_TOO_SHORT: &str = "Password is too short (minimum is 7 characters)";
pub const PASSWORD_COMPLEXITY: &str = "Password must include at least one uppercase letter, one lowercase letter, one digit, and one symbol";
pub const FAMILY_NAME_BLANK: &str = "Family name can't be blank";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\w+\-.]+@[a-z\d\-.]+\.[a-z]+$").expect("email pattern is valid")
});

#[must_use]
pub fn validate_email(email: &str) -> Vec<String> {
    if email.trim().is_empty() {
        return vec![EMAIL_BLANK.to_string()];
    }

    if EMAIL_RE.is_match(email) {
        Vec::new()
    } else {
        vec![EMAIL_INVALID.to_string()]
    }
}

#[must_use]
pub fn validate_password(password: &str) -> Vec<String> {
    if password.is_empty() {
        return vec![PASSWORD_BLANK.to_string()];
    }

    let mut errors = Vec::new();

    if password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.push(PASSWORD_TOO_SHORT.to_string());
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(&c));

    if !(has_upper && has_lower && has_digit && has_symbol) {
        errors.push(PASSWORD_COMPLEXITY.to_string());
    }

    errors
}

#[must_use]
pub fn validate_family_name(name: &str) -> Vec<String> {
    if name.trim().is_empty() {
        vec![FAMILY_NAME_BLANK.to_string()]
    } else {
        Vec::new()
    }
}
