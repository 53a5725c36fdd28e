//!
//! aedes server binary
//! -------------------
//! Command-line entry point for the planner shell HTTP server. Supports
//! configuration via CLI flags and environment variables; flags win.

use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;

use aedes_planner::config::{AuthBackend, Config};

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            return args.get(i + 1).map(|s| s.as_str());
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn apply_args(mut config: Config, args: &[String]) -> Result<Config> {
    if let Some(v) = arg_value(args, "--http-port") {
        config.http_port = v.parse().map_err(|e| anyhow!("--http-port {v}: {e}"))?;
    }
    if let Some(v) = arg_value(args, "--host") {
        config.bind_host = v.to_string();
    }
    if let Some(v) = arg_value(args, "--login-delay-ms") {
        let ms: u64 = v.parse().map_err(|e| anyhow!("--login-delay-ms {v}: {e}"))?;
        config.login_delay = Duration::from_millis(ms);
    }
    if let Some(v) = arg_value(args, "--auth") {
        config.auth_backend = v.parse::<AuthBackend>().map_err(|e| anyhow!(e))?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("aedes Server\n\nUSAGE:\n  aedes_server [--http-port N] [--host H] [--login-delay-ms N] [--auth demo|accounts]\n\nOPTIONS:\n  --http-port N        HTTP port (env: AEDES_HTTP_PORT, default 7878)\n  --host H             Bind host (env: AEDES_BIND_HOST, default 0.0.0.0)\n  --login-delay-ms N   Simulated sign-in latency (env: AEDES_LOGIN_DELAY_MS, default 1000)\n  --auth BACKEND       demo accepts any credentials; accounts keeps an in-memory registry (env: AEDES_AUTH, default demo)\n");
        return Ok(());
    }

    let config = apply_args(Config::from_env(), &args)?;
    println!("aedes starting on {} with {:?} auth", config.bind_address(), config.auth_backend);
    tracing::info!("Using bind={}, auth={:?}", config.bind_address(), config.auth_backend);

    aedes_planner::server::run_with_config(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn flags_override_config() {
        let c = apply_args(Config::default(), &args("aedes_server --http-port 9001 --auth accounts --login-delay-ms 5")).unwrap();
        assert_eq!(c.http_port, 9001);
        assert_eq!(c.auth_backend, AuthBackend::Accounts);
        assert_eq!(c.login_delay, Duration::from_millis(5));
        assert_eq!(c.bind_host, "0.0.0.0");
    }

    #[test]
    fn bad_flags_are_errors() {
        assert!(apply_args(Config::default(), &args("x --http-port nope")).is_err());
        assert!(apply_args(Config::default(), &args("x --auth ldap")).is_err());
    }
}
