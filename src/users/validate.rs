use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username must not be empty")]
    Empty,

    #[error("input contains non-ascii characters")]
    NonAscii,
}

// addr-spec only: local@domain with a dot in the domain, no whitespace.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email regex")
});

pub fn is_email(s: &str) -> bool {
    EMAIL_RE.is_match(s.trim())
}

/// Lowercase a username and reject anything that is not ASCII after NFKD
/// decomposition (so "é" is rejected, fullwidth "Ａ" folds to "a").
pub fn normalize_username(raw: &str) -> Result<String, UsernameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { return Err(UsernameError::Empty); }
    let decomposed: String = trimmed.nfkd().collect();
    if !decomposed.is_ascii() { return Err(UsernameError::NonAscii); }
    Ok(decomposed.to_ascii_lowercase())
}
