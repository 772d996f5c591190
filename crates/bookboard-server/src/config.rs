use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Server settings, read from `BOOKBOARD_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Cookie signing secret. A random per-process key is used when unset.
    pub session_secret: Option<String>,
    pub secure_cookies: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("BOOKBOARD_HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port: u16 = lookup("BOOKBOARD_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("BOOKBOARD_PORT must be a port number")?;
        let db_path: PathBuf = lookup("BOOKBOARD_DB_PATH")
            .unwrap_or_else(|| "bookboard.db".into())
            .into();
        let session_secret = lookup("BOOKBOARD_SESSION_SECRET").filter(|s| !s.is_empty());
        let secure_cookies = match lookup("BOOKBOARD_SECURE_COOKIES").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => bail!("BOOKBOARD_SECURE_COOKIES must be true or false, got {:?}", other),
        };

        Ok(Self {
            host,
            port,
            db_path,
            session_secret,
            secure_cookies,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr().unwrap(), "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.db_path, PathBuf::from("bookboard.db"));
        assert!(config.session_secret.is_none());
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("BOOKBOARD_HOST", "0.0.0.0"),
            ("BOOKBOARD_PORT", "8080"),
            ("BOOKBOARD_DB_PATH", "/var/lib/bookboard/board.db"),
            ("BOOKBOARD_SECURE_COOKIES", "true"),
        ])
        .unwrap();
        assert_eq!(config.addr().unwrap().port(), 8080);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/bookboard/board.db"));
        assert!(config.secure_cookies);
    }

    #[test]
    fn test_bad_values() {
        assert!(config(&[("BOOKBOARD_PORT", "http")]).is_err());
        assert!(config(&[("BOOKBOARD_SECURE_COOKIES", "maybe")]).is_err());
        assert!(config(&[("BOOKBOARD_HOST", "not a host")]).unwrap().addr().is_err());
    }
}
