use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;

/// Secrets that are only fit for local development.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "dahak-auto-secret-key-change-this",
];

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("DAHAK_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = get("DAHAK_PORT").unwrap_or_else(|| "3000".into());
        let addr: SocketAddr = format!("{}:{}", host, port).parse().map_err(|_| ConfigError::Invalid {
            key: "DAHAK_HOST/DAHAK_PORT",
            expected: "a valid listen address",
            value: format!("{}:{}", host, port),
        })?;

        let max_upload_mb = match get("DAHAK_MAX_UPLOAD_MB") {
            Some(v) => v.parse::<usize>().ok().filter(|mb| *mb > 0).ok_or(ConfigError::Invalid {
                key: "DAHAK_MAX_UPLOAD_MB",
                expected: "a positive integer",
                value: v,
            })?,
            None => 10,
        };

        let jwt_secret = match get("DAHAK_JWT_SECRET") {
            Some(s) if !PLACEHOLDER_SECRETS.contains(&s.as_str()) => s,
            _ => {
                warn!("DAHAK_JWT_SECRET is unset or a placeholder; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Self {
            addr,
            db_path: get("DAHAK_DB_PATH").unwrap_or_else(|| "data/dahak_auto.db".into()).into(),
            upload_dir: get("DAHAK_UPLOAD_DIR").unwrap_or_else(|| "uploads".into()).into(),
            static_dir: get("DAHAK_STATIC_DIR").map(PathBuf::from),
            jwt_secret,
            admin_username: get("DAHAK_ADMIN_USERNAME").unwrap_or_else(|| "admin".into()),
            admin_password: get("DAHAK_ADMIN_PASSWORD").unwrap_or_else(|| "admin123".into()),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.db_path, PathBuf::from("data/dahak_auto.db"));
        assert_eq!(cfg.upload_dir, PathBuf::from("uploads"));
        assert!(cfg.static_dir.is_none());
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.admin_username, "admin");
        assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("DAHAK_HOST", "127.0.0.1"),
            ("DAHAK_PORT", "8080"),
            ("DAHAK_JWT_SECRET", "s3cr3t-value"),
            ("DAHAK_STATIC_DIR", "dist"),
            ("DAHAK_MAX_UPLOAD_MB", "2"),
        ])
        .unwrap();
        assert_eq!(cfg.addr.to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.jwt_secret, "s3cr3t-value");
        assert_eq!(cfg.static_dir, Some(PathBuf::from("dist")));
        assert_eq!(cfg.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn placeholder_secret_is_replaced() {
        let cfg = config(&[("DAHAK_JWT_SECRET", "dahak-auto-secret-key-change-this")]).unwrap();
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config(&[("DAHAK_PORT", "http")]).is_err());
        assert!(config(&[("DAHAK_MAX_UPLOAD_MB", "0")]).is_err());
    }
}
