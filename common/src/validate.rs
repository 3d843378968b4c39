//! Input validation shared by the registration endpoints.

/// Minimum password length for customer registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum password length for admin accounts.
pub const MIN_ADMIN_PASSWORD_LEN: usize = 8;

/// Lightweight email shape check: one '@' with a dot somewhere after it,
/// no whitespace. Matches the original `^[^\s@]+@[^\s@]+\.[^\s@]+$` intent.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Canonical form used for storage and uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
