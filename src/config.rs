//! Runtime configuration. Values come from the environment; the server binary
//! lets command-line flags override them.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthBackend {
    /// Any email/password pair succeeds.
    #[default]
    Demo,
    /// In-memory registry with Argon2-hashed passwords.
    Accounts,
}

impl FromStr for AuthBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(AuthBackend::Demo),
            "accounts" => Ok(AuthBackend::Accounts),
            other => Err(format!("unknown auth backend '{other}' (expected demo or accounts)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub bind_host: String,
    pub login_delay: Duration,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    pub auth_backend: AuthBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 7878,
            bind_host: "0.0.0.0".to_string(),
            login_delay: Duration::from_millis(1000),
            session_ttl: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(60),
            auth_backend: AuthBackend::Demo,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Config::default();
        Self {
            http_port: try_load("AEDES_HTTP_PORT", d.http_port),
            bind_host: try_load("AEDES_BIND_HOST", d.bind_host),
            login_delay: Duration::from_millis(try_load("AEDES_LOGIN_DELAY_MS", d.login_delay.as_millis() as u64)),
            session_ttl: Duration::from_secs(try_load("AEDES_SESSION_TTL_SECS", d.session_ttl.as_secs())),
            sweep_interval: Duration::from_secs(try_load("AEDES_SWEEP_SECS", d.sweep_interval.as_secs())),
            auth_backend: try_load("AEDES_AUTH", d.auth_backend),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.http_port)
    }
}

/// Parses `key` from the environment, keeping `default` when unset or invalid.
fn try_load<T: FromStr>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

pub fn parse_or<T: FromStr>(key: &str, raw: &str, default: T) -> T
where
    T::Err: Display,
{
    match raw.trim().parse() {
        Ok(v) => {
            info!("{key} set from environment");
            v
        }
        Err(e) => {
            warn!("Invalid {key} value '{raw}': {e}; using default");
            default
        }
    }
}
