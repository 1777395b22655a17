//! Field checks shared by the form-backed operations.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

pub fn is_valid_url(value: &str) -> bool {
    lazy_static! {
        static ref URL_RE: Regex =
            Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url regex compiles");
    }
    URL_RE.is_match(value)
}

/// Trimmed value whose length in chars lies in `min..=max`.
pub fn bounded(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
    too_short: &str,
) -> Result<String, ValidationError> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::new(field, too_short));
    }
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("Must be at most {max} characters."),
        ));
    }
    Ok(value.to_owned())
}

/// Like [`bounded`], but an absent or empty value becomes `None`.
pub fn optional_bounded(
    field: &'static str,
    value: Option<&str>,
    min: usize,
    max: usize,
    too_short: &str,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => bounded(field, v, min, max, too_short).map(Some),
    }
}

/// An absent or empty value becomes `None`; anything else must be an http(s) URL.
pub fn optional_url(
    field: &'static str,
    value: Option<&str>,
    invalid: &str,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if is_valid_url(v) => Ok(Some(v.to_owned())),
        Some(_) => Err(ValidationError::new(field, invalid)),
    }
}
