//! Username and credential rules.

use crate::domain::error::DomainError;

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validate and normalize a requested username.
///
/// Usernames are path segments (`/profile/{username}/`), so the accepted
/// alphabet is restricted to letters, digits, `_`, `.` and `-`.
pub fn normalize_username(input: &str) -> Result<String, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("username must not be empty"));
    }
    if trimmed.len() > MAX_USERNAME_LEN {
        return Err(DomainError::validation(format!(
            "username longer than {MAX_USERNAME_LEN} characters"
        )));
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
    {
        return Err(DomainError::validation(
            "username may only contain letters, digits, `_`, `.` and `-`",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn check_password(input: &str) -> Result<(), DomainError> {
    if input.len() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password shorter than {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_accept_the_url_safe_alphabet() {
        assert_eq!(normalize_username(" ada.lovelace-42_ ").expect("valid"), "ada.lovelace-42_");
    }

    #[test]
    fn usernames_reject_path_breaking_characters() {
        for bad in ["", "   ", "with space", "slash/y", "ünïcode"] {
            assert!(normalize_username(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_password("hunter2").is_err());
        assert!(check_password("hunter2hunter2").is_ok());
    }
}
