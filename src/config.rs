//! Runtime configuration from `QUILL_*` environment variables.
//!
//! CLI flags override these values; see `main.rs`.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::backend::Engine;
use crate::engine::Style;

pub const STYLE_ENV_VAR: &str = "QUILL_STYLE";
pub const REGEN_ENV_VAR: &str = "QUILL_REGEN";
pub const MAX_LENGTH_ENV_VAR: &str = "QUILL_MAX_LENGTH";
pub const ENGINE_ENV_VAR: &str = "QUILL_ENGINE";

/// Subject length past which candidates are flagged.
pub const DEFAULT_MAX_LENGTH: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub style: Style,
    /// Regeneration counter passed to the engine as its variant.
    pub variant: u64,
    /// 0 disables the length check.
    pub max_length: usize,
    pub engine: Engine,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style: Style::Conv,
            variant: 0,
            max_length: DEFAULT_MAX_LENGTH,
            engine: Engine::Local,
        }
    }
}

impl Config {
    /// Defaults overlaid with whatever valid `QUILL_*` variables are set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            style: env_or(STYLE_ENV_VAR, defaults.style),
            variant: env_or(REGEN_ENV_VAR, defaults.variant),
            max_length: env_or(MAX_LENGTH_ENV_VAR, defaults.max_length),
            engine: env_or(ENGINE_ENV_VAR, defaults.engine),
        }
    }
}

/// Parse `var` as `T`, falling back to `default` when unset or empty.
///
/// Logs a warning if the variable is set but does not parse.
pub fn env_or<T>(var: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => match v.trim().parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                warn!("Invalid {} value '{}' ({}), using default {}", var, v, e, default);
                default
            }
        },
        _ => default,
    }
}

/// Timeout in whole seconds from `var`, or `default_secs`.
pub fn timeout_from_env(var: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_or(var, default_secs))
}
