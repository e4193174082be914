//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::gps::GpsConfig;

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_SNAPSHOT: &str = "linehaul_snapshot.json";
const DEFAULT_REFRESH_SECS: u64 = 300;

/// Error returned for an unusable environment variable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {var}: '{value}' ({reason})")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: &'static str,
}

/// Configuration for the server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (`LINEHAUL_BIND`).
    pub bind: SocketAddr,

    /// Reference data snapshot file (`LINEHAUL_SNAPSHOT`).
    pub snapshot_path: PathBuf,

    /// How often to reload the snapshot (`LINEHAUL_REFRESH_SECS`).
    pub refresh_interval: Duration,

    /// GPS provider, when `GPS_BASE_URL` and `GPS_API_KEY` are both set.
    pub gps: Option<GpsConfig>,
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("LINEHAUL_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|_| ConfigError {
            var: "LINEHAUL_BIND",
            value: bind_raw.clone(),
            reason: "expected HOST:PORT",
        })?;

        let snapshot_path = get("LINEHAUL_SNAPSHOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT));

        let refresh_secs = match get("LINEHAUL_REFRESH_SECS") {
            Some(raw) => parse_secs("LINEHAUL_REFRESH_SECS", &raw)?,
            None => DEFAULT_REFRESH_SECS,
        };

        let gps = match (get("GPS_BASE_URL"), get("GPS_API_KEY")) {
            (Some(url), Some(key)) => {
                let mut config = GpsConfig::new(url, key);
                if let Some(raw) = get("GPS_TIMEOUT_SECS") {
                    config = config.with_timeout(parse_secs("GPS_TIMEOUT_SECS", &raw)?);
                }
                Some(config)
            }
            _ => None,
        };

        Ok(Self {
            bind,
            snapshot_path,
            refresh_interval: Duration::from_secs(refresh_secs),
            gps,
        })
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError {
            var,
            value: raw.to_string(),
            reason: "must be at least 1",
        }),
        Ok(secs) => Ok(secs),
        Err(_) => Err(ConfigError {
            var,
            value: raw.to_string(),
            reason: "expected a whole number of seconds",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.snapshot_path, PathBuf::from("linehaul_snapshot.json"));
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert!(config.gps.is_none());
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("LINEHAUL_BIND", "0.0.0.0:8080"),
            ("LINEHAUL_SNAPSHOT", "/var/lib/linehaul/snapshot.json"),
            ("LINEHAUL_REFRESH_SECS", "60"),
            ("GPS_BASE_URL", "https://gps.example.com"),
            ("GPS_API_KEY", "secret"),
            ("GPS_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        let gps = config.gps.unwrap();
        assert_eq!(gps.base_url, "https://gps.example.com");
        assert_eq!(gps.timeout_secs, 5);
    }

    #[test]
    fn gps_needs_url_and_key() {
        let config = config(&[("GPS_BASE_URL", "https://gps.example.com")]).unwrap();
        assert!(config.gps.is_none());
    }

    #[test]
    fn blank_values_use_defaults() {
        let config = config(&[("LINEHAUL_BIND", "  ")]).unwrap();
        assert_eq!(config.bind.port(), 3000);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = config(&[("LINEHAUL_BIND", "localhost")]).unwrap_err();
        assert_eq!(err.var, "LINEHAUL_BIND");

        let err = config(&[("LINEHAUL_REFRESH_SECS", "soon")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid LINEHAUL_REFRESH_SECS: 'soon' (expected a whole number of seconds)"
        );

        let err = config(&[("LINEHAUL_REFRESH_SECS", "0")]).unwrap_err();
        assert_eq!(err.reason, "must be at least 1");
    }
}
