//! Environment-sourced configuration.
//!
//! Everything is read once at startup. Missing required variables and malformed
//! values are fatal; the binary reports them with context and exits.

use std::time::Duration;

use thiserror::Error;

use crate::identity::{CodecError, CredentialKeys};

pub const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Key material and lifetimes for one credential kind.
#[derive(Clone)]
pub struct TokenConfig {
    pub private_key_b64: String,
    pub public_key_b64: String,
    pub expires_in: Duration,
    /// Cookie `Max-Age`.
    pub max_age: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("expires_in", &self.expires_in)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl TokenConfig {
    pub fn keys(&self) -> Result<CredentialKeys, CodecError> {
        CredentialKeys::from_base64_pem(&self.private_key_b64, &self.public_key_b64)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_port: u16,
    pub access: TokenConfig,
    pub refresh: TokenConfig,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub session_store_timeout: Duration,
    pub session_sweep_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access = token_config(
            &lookup,
            "ACCESS_TOKEN_PRIVATE_KEY",
            "ACCESS_TOKEN_PUBLIC_KEY",
            "ACCESS_TOKEN_EXPIRED_IN",
            "ACCESS_TOKEN_MAX_AGE",
        )?;
        let refresh = token_config(
            &lookup,
            "REFRESH_TOKEN_PRIVATE_KEY",
            "REFRESH_TOKEN_PUBLIC_KEY",
            "REFRESH_TOKEN_EXPIRED_IN",
            "REFRESH_TOKEN_MAX_AGE",
        )?;

        let http_port = match lookup("FACTDECK_HTTP_PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|e| invalid("FACTDECK_HTTP_PORT", e))?,
            None => DEFAULT_HTTP_PORT,
        };
        let cookie_domain = lookup("COOKIE_DOMAIN").map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(v) => parse_bool(&v).ok_or_else(|| invalid("COOKIE_SECURE", format!("not a boolean: {}", v)))?,
            None => false,
        };
        let timeout_ms = parse_u64_or(&lookup, "SESSION_STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;
        let sweep_secs = parse_u64_or(&lookup, "SESSION_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
        if timeout_ms == 0 {
            return Err(invalid("SESSION_STORE_TIMEOUT_MS", "must be positive"));
        }
        if sweep_secs == 0 {
            return Err(invalid("SESSION_SWEEP_INTERVAL_SECS", "must be positive"));
        }

        Ok(Self {
            http_port,
            access,
            refresh,
            cookie_domain,
            cookie_secure,
            session_store_timeout: Duration::from_millis(timeout_ms),
            session_sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

fn token_config<F>(
    lookup: &F,
    private: &'static str,
    public: &'static str,
    expires_in: &'static str,
    max_age: &'static str,
) -> Result<TokenConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let private_key_b64 = required(lookup, private)?;
    let public_key_b64 = required(lookup, public)?;
    let expires = parse_duration(&required(lookup, expires_in)?).map_err(|r| invalid(expires_in, r))?;
    let minutes = required(lookup, max_age)?.trim().parse::<u64>().map_err(|e| invalid(max_age, e))?;
    if expires.is_zero() {
        return Err(invalid(expires_in, "must be positive"));
    }
    Ok(TokenConfig { private_key_b64, public_key_b64, expires_in: expires, max_age: Duration::from_secs(minutes * 60) })
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty()).ok_or(ConfigError::Missing(name))
}

fn parse_u64_or<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) => v.trim().parse::<u64>().map_err(|e| invalid(name, e)),
        None => Ok(default),
    }
}

fn invalid(name: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid { name, reason: reason.to_string() }
}

pub fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse durations such as `15m`, `60s`, `250ms` or `1h30m`. Every number needs a
/// unit; a bare `0` is the only exception.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".into());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    let bytes = s.as_bytes();
    let mut total = Duration::ZERO;
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() { i += 1; }
        if start == i {
            return Err(format!("expected a number at offset {} in '{}'", start, s));
        }
        let n: u64 = s[start..i].parse().map_err(|e| format!("{}: {}", s, e))?;
        let unit_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() { i += 1; }
        let part = match &s[unit_start..i] {
            "ms" => Duration::from_millis(n),
            "s" => Duration::from_secs(n),
            "m" => Duration::from_secs(n.saturating_mul(60)),
            "h" => Duration::from_secs(n.saturating_mul(3600)),
            "" => return Err(format!("missing unit in '{}'", s)),
            other => return Err(format!("unknown unit '{}' in '{}'", other, s)),
        };
        total = total.checked_add(part).ok_or_else(|| format!("duration overflow: {}", s))?;
    }
    Ok(total)
}
