//! Client configuration.
//!
//! `HttpConfig` is fixed once the client is built. Partial configuration
//! (from JSON, the environment or code) is layered onto the defaults with
//! `HttpConfig::extend`.

use serde::Deserialize;

pub const ENDPOINT_ENV: &str = "FETCHWRAP_ENDPOINT";
pub const DEBUG_ENV: &str = "FETCHWRAP_DEBUG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpConfig {
    /// Prefix for every relative request url. Joined by plain concatenation.
    pub endpoint: String,
    /// Emit per-attempt `tracing` events.
    pub debug: bool,
}

/// Partial configuration; `None` fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpConfigOverrides {
    pub endpoint: Option<String>,
    pub debug: Option<bool>,
}

impl HttpConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            debug: false,
        }
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Merge `overrides` on top of `self`.
    pub fn extend(self, overrides: HttpConfigOverrides) -> Self {
        Self {
            endpoint: overrides.endpoint.unwrap_or(self.endpoint),
            debug: overrides.debug.unwrap_or(self.debug),
        }
    }

    /// Defaults overridden by `FETCHWRAP_ENDPOINT` / `FETCHWRAP_DEBUG`.
    pub fn from_env() -> Self {
        Self::default().extend(HttpConfigOverrides::from_lookup(|key| std::env::var(key).ok()))
    }
}

impl HttpConfigOverrides {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            endpoint: lookup(ENDPOINT_ENV),
            debug: lookup(DEBUG_ENV).map(|v| parse_flag(&v)),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
