//! Input Validation
//! Mission: Check request payloads and report every violated field at once

use crate::auth::models::{FieldError, LoginRequest, RegisterRequest};

pub const MIN_PASSWORD_LEN: usize = 8;
/// bcrypt only reads the first 72 bytes
pub const MAX_PASSWORD_BYTES: usize = 72;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_NAME_LEN: usize = 64;

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a registration payload
pub fn validate_registration(req: &RegisterRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if let Some(err) = check_email(&req.email) {
        errors.push(err);
    }
    errors.extend(check_password_strength(&req.password));

    if let Some(name) = &req.name {
        let name = name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "Name must not be blank"));
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.push(FieldError::new(
                "name",
                format!("Name must be at most {MAX_NAME_LEN} characters"),
            ));
        }
    }

    finish(errors)
}

/// Validate a login payload. Only shape is checked here; password policy
/// is not disclosed to anonymous callers.
pub fn validate_login(req: &LoginRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if let Some(err) = check_email(&req.email) {
        errors.push(err);
    }
    if req.password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }

    finish(errors)
}

fn finish(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_email(raw: &str) -> Option<FieldError> {
    let email = raw.trim();
    if email.is_empty() {
        return Some(FieldError::new("email", "Email is required"));
    }
    if email.len() > MAX_EMAIL_LEN || !is_valid_email(email) {
        return Some(FieldError::new("email", "Invalid email format"));
    }
    None
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }

    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    if domain.is_empty() || domain.len() > 253 || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn check_password_strength(password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
        return errors;
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at most {MAX_PASSWORD_BYTES} bytes"),
        ));
    }
    if !password.chars().any(char::is_alphabetic) {
        errors.push(FieldError::new(
            "password",
            "Password must contain at least one letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new(
            "password",
            "Password must contain at least one digit",
        ));
    }

    errors
}
