// src/core/validate.rs

//! Normalization and validation of the admin identity fields.
//!
//! The three `normalize_*` functions are total: they never fail, they only
//! report whether the input is acceptable. Mapping a rejection to an error
//! message happens in [`resolve_identity`].

use crate::config::Config;
use crate::core::errors::BootstrapError;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 256;
pub const EMAIL_MAX_LEN: usize = 254;
pub const EMAIL_LOCAL_MAX_LEN: usize = 64;
pub const EMAIL_DOMAIN_MIN_LEN: usize = 3;

/// Punctuation allowed in the local part of an address, next to `[a-z0-9]`.
const EMAIL_LOCAL_PUNCTUATION: &str = ".!#$%&'*+/=?^_`{|}~-";

/// The outcome of normalizing the optional email input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailInput {
    /// The input was empty; the stored email is left alone.
    NotProvided,
    Valid(String),
    Invalid,
}

/// The validated identity that is handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// Trims the username and accepts it if it is 3-32 characters of `[A-Za-z0-9_.-]`.
pub fn normalize_username(raw: &str) -> Option<String> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return None;
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return None;
    }
    Some(username.to_string())
}

/// Accepts the password untouched if it is 8-256 characters long.
pub fn normalize_password(raw: &str) -> Option<String> {
    let len = raw.chars().count();
    (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN)
        .contains(&len)
        .then(|| raw.to_string())
}

/// Trims and lowercases an email address and checks it against a
/// conservative subset of RFC 5321 syntax.
pub fn normalize_email(raw: &str) -> EmailInput {
    if raw.is_empty() {
        return EmailInput::NotProvided;
    }

    let email = raw.trim().to_lowercase();
    if email.is_empty() || email.chars().count() > EMAIL_MAX_LEN {
        return EmailInput::Invalid;
    }
    if email.chars().any(char::is_whitespace) {
        return EmailInput::Invalid;
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return EmailInput::Invalid;
    };
    if local.is_empty() || domain.is_empty() {
        return EmailInput::Invalid;
    }

    if local.chars().count() > EMAIL_LOCAL_MAX_LEN
        || !local
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || EMAIL_LOCAL_PUNCTUATION.contains(c))
    {
        return EmailInput::Invalid;
    }

    if domain.chars().count() < EMAIL_DOMAIN_MIN_LEN
        || !domain.contains('.')
        || domain.contains("..")
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return EmailInput::Invalid;
    }

    EmailInput::Valid(email)
}

/// Validates the identity carried by `config`.
///
/// Returns the first failing field, checking username, then password, then
/// email. Nothing here touches the filesystem.
pub fn resolve_identity(config: &Config) -> Result<AdminIdentity, BootstrapError> {
    let raw_username = config
        .admin_username
        .as_deref()
        .ok_or(BootstrapError::MissingField {
            field: "ADMIN_USER",
        })?;
    let username = normalize_username(raw_username).ok_or(BootstrapError::InvalidField {
        field: "ADMIN_USER",
        reason: "must be 3-32 characters of letters, digits, '_', '.' or '-'",
    })?;

    let raw_password = config
        .admin_password
        .as_deref()
        .ok_or(BootstrapError::MissingField {
            field: "ADMIN_PASS",
        })?;
    let password = normalize_password(raw_password).ok_or(BootstrapError::InvalidField {
        field: "ADMIN_PASS",
        reason: "must be 8-256 characters long",
    })?;

    let email = match normalize_email(config.admin_email.as_deref().unwrap_or_default()) {
        EmailInput::NotProvided => None,
        EmailInput::Valid(email) => Some(email),
        EmailInput::Invalid => {
            return Err(BootstrapError::InvalidField {
                field: "ADMIN_EMAIL",
                reason: "is not a valid email address",
            });
        }
    };

    Ok(AdminIdentity {
        username,
        password,
        email,
    })
}
