use crate::error::{RankError, Result};
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const MODEL_VAR: &str = "RANKSCOPE_MODEL";
pub const MAX_TOKENS_VAR: &str = "RANKSCOPE_MAX_TOKENS";
pub const API_BASE_VAR: &str = "RANKSCOPE_API_BASE";
pub const TIMEOUT_VAR: &str = "RANKSCOPE_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "claude-opus-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const PLACEHOLDER_KEY: &str = "your_api_key_here";

/// A credential that passed validation. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let key = raw.trim();
        if key.is_empty() {
            return Err(RankError::Configuration(format!("{} is empty", API_KEY_VAR)));
        }
        if key == PLACEHOLDER_KEY {
            return Err(RankError::Configuration(format!(
                "{} still holds the placeholder value; set a real key in .env.local",
                API_KEY_VAR
            )));
        }
        Ok(ApiKey(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub api_key: ApiKey,
    pub model: String,
    pub max_tokens: u32,
    pub api_base: String,
    pub timeout: Duration,
}

impl InsightConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Builds the configuration from process variables. Call [`load_dotenv`] first
    /// to pick up `.env.local` / `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_key = lookup(API_KEY_VAR)
            .ok_or_else(|| RankError::Configuration(format!("{} is not set", API_KEY_VAR)))?;
        let mut cfg = Self::new(ApiKey::new(raw_key)?);
        if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.trim().is_empty()) {
            cfg.model = model.trim().to_string();
        }
        if let Some(raw) = lookup(MAX_TOKENS_VAR) {
            cfg.max_tokens = parse_number(MAX_TOKENS_VAR, &raw)?;
        }
        if let Some(base) = lookup(API_BASE_VAR).filter(|b| !b.trim().is_empty()) {
            cfg.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            cfg.timeout = Duration::from_secs(parse_number(TIMEOUT_VAR, &raw)?);
        }
        debug!(model = %cfg.model, max_tokens = cfg.max_tokens, api_base = %cfg.api_base, "insight config loaded");
        Ok(cfg)
    }
}

fn parse_number<T: std::str::FromStr + Default + PartialEq>(var: &str, raw: &str) -> Result<T> {
    match raw.trim().parse::<T>() {
        Ok(n) if n != T::default() => Ok(n),
        _ => Err(RankError::Configuration(format!("{} must be a positive integer, got '{}'", var, raw))),
    }
}

/// Loads `.env.local` and then `.env` when present. Variables already set win.
pub fn load_dotenv() {
    if dotenv::from_filename(".env.local").is_ok() {
        debug!("loaded .env.local");
    }
    if dotenv::dotenv().is_ok() {
        debug!("loaded .env");
    }
}
