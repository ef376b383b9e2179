//! Server configuration loaded from environment variables

use crate::catalog;
use crate::error::ConfigError;
use crate::types::SessionConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Applied to sessions created implicitly on first join
    pub session: SessionConfig,
    /// Plain text prompt file; the built-in catalog is used when unset
    pub prompt_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 6574)),
            session: SessionConfig::default(),
            prompt_file: None,
        }
    }
}

/// Read a trimmed, non-empty env var
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Parse an env var, warning and falling back to `default` on bad input
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env_value(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}

impl ServerConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = env_parse("PROMPTDUEL_BIND_ADDR", defaults.bind_addr);
        let max_participants = env_parse(
            "PROMPTDUEL_MAX_PARTICIPANTS",
            defaults.session.max_participants,
        );
        let max_points = env_parse("PROMPTDUEL_MAX_POINTS", defaults.session.max_points);

        let mut session = SessionConfig {
            max_participants,
            max_points,
        };
        if let Err(e) = session.validate() {
            tracing::warn!("Invalid session settings ({}), using defaults", e);
            session = defaults.session;
        }

        Self {
            bind_addr,
            session,
            prompt_file: env_value("PROMPTDUEL_PROMPT_FILE").map(PathBuf::from),
        }
    }

    /// Resolve the prompt catalog new sessions draw from
    pub fn load_catalog(&self) -> Result<Vec<String>, ConfigError> {
        match &self.prompt_file {
            Some(path) => catalog::load_catalog(path),
            None => Ok(catalog::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const KEYS: &[&str] = &[
        "PROMPTDUEL_BIND_ADDR",
        "PROMPTDUEL_MAX_PARTICIPANTS",
        "PROMPTDUEL_MAX_POINTS",
        "PROMPTDUEL_PROMPT_FILE",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    fn set_env(key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ServerConfig::from_env();

        assert_eq!(config.bind_addr.port(), 6574);
        assert_eq!(config.session, SessionConfig::default());
        assert!(config.prompt_file.is_none());
        assert_eq!(config.load_catalog().unwrap(), catalog::builtin());
    }

    #[test]
    #[serial]
    fn test_reads_overrides() {
        clear_env();
        set_env("PROMPTDUEL_BIND_ADDR", "127.0.0.1:9000");
        set_env("PROMPTDUEL_MAX_PARTICIPANTS", "5");
        set_env("PROMPTDUEL_MAX_POINTS", " 7 ");

        let config = ServerConfig::from_env();
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.session.max_participants, 5);
        assert_eq!(config.session.max_points, 7);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        set_env("PROMPTDUEL_MAX_PARTICIPANTS", "lots");
        set_env("PROMPTDUEL_MAX_POINTS", "0");

        let config = ServerConfig::from_env();
        assert_eq!(config.session, SessionConfig::default());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_prompt_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Custom prompt").unwrap();
        set_env("PROMPTDUEL_PROMPT_FILE", file.path().to_str().unwrap());

        let config = ServerConfig::from_env();
        assert_eq!(config.load_catalog().unwrap(), vec!["Custom prompt"]);
        clear_env();
    }
}
