// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup and is immutable afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | Base64 HS256 signing key, at least 32 bytes decoded | Required |
//! | `JWT_TTL_SECS` | Token lifetime in seconds | `86400` |
//! | `DATA_DIR` | Directory holding the database file | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` | PEM certificate chain; HTTPS when set with the key | Unset |
//! | `TLS_KEY_PATH` | PEM private key | Unset |
//! | `AUTH_LOOKUP_TIMEOUT_MS` | Bound on the per-request principal lookup | `2000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use base64ct::{Base64, Encoding};

/// Environment variable name for the token signing secret.
///
/// Standard base64. Rotating it invalidates every outstanding token.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable name for the token lifetime in seconds.
pub const JWT_TTL_SECS_ENV: &str = "JWT_TTL_SECS";

/// Default token lifetime (24 hours).
pub const DEFAULT_JWT_TTL_SECS: u64 = 86_400;

/// Minimum decoded secret length for HS256.
pub const MIN_SECRET_BYTES: usize = 32;

/// Environment variable name for the data directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const DEFAULT_DATA_DIR: &str = "./data";

pub const HOST_ENV: &str = "HOST";
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 8080;

/// Environment variable name for the TLS certificate chain (PEM).
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";

/// Environment variable name for the TLS private key (PEM).
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// Environment variable name for the principal lookup bound.
pub const AUTH_LOOKUP_TIMEOUT_MS_ENV: &str = "AUTH_LOOKUP_TIMEOUT_MS";

pub const DEFAULT_AUTH_LOOKUP_TIMEOUT_MS: u64 = 2_000;

/// Environment variable name for the log output format.
///
/// # Values
/// - `json` - one JSON object per line
/// - anything else - human-readable output
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Typed server configuration.
#[derive(Clone)]
pub struct Config {
    pub jwt_secret: Vec<u8>,
    pub jwt_ttl: Duration,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// Certificate and key paths when HTTPS is enabled.
    pub tls: Option<(PathBuf, PathBuf)>,
    pub auth_lookup_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("data_dir", &self.data_dir)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("auth_lookup_timeout", &self.auth_lookup_timeout)
            .finish()
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        let jwt_secret = decode_secret(&secret)?;

        let jwt_ttl_secs = parse_or(&lookup, JWT_TTL_SECS_ENV, DEFAULT_JWT_TTL_SECS)?;
        if jwt_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                name: JWT_TTL_SECS_ENV,
                reason: "must be positive".to_string(),
            });
        }

        let tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: TLS_CERT_PATH_ENV,
                    reason: format!("{TLS_CERT_PATH_ENV} and {TLS_KEY_PATH_ENV} must be set together"),
                })
            }
        };

        Ok(Self {
            jwt_secret,
            jwt_ttl: Duration::from_secs(jwt_ttl_secs),
            data_dir: PathBuf::from(lookup(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?,
            tls,
            auth_lookup_timeout: Duration::from_millis(parse_or(
                &lookup,
                AUTH_LOOKUP_TIMEOUT_MS_ENV,
                DEFAULT_AUTH_LOOKUP_TIMEOUT_MS,
            )?),
        })
    }
}

fn decode_secret(encoded: &str) -> Result<Vec<u8>, ConfigError> {
    let bytes = Base64::decode_vec(encoded.trim()).map_err(|e| ConfigError::Invalid {
        name: JWT_SECRET_ENV,
        reason: format!("not valid base64 ({e})"),
    })?;
    if bytes.len() < MIN_SECRET_BYTES {
        return Err(ConfigError::Invalid {
            name: JWT_SECRET_ENV,
            reason: format!("decodes to {} bytes, need at least {MIN_SECRET_BYTES}", bytes.len()),
        });
    }
    Ok(bytes)
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // 32 bytes of 'k'
    const SECRET_B64: &str = "a2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2s=";

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[(JWT_SECRET_ENV, SECRET_B64)]).unwrap();
        assert_eq!(config.jwt_secret, vec![b'k'; 32]);
        assert_eq!(config.jwt_ttl, Duration::from_secs(DEFAULT_JWT_TTL_SECS));
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.tls.is_none());
        assert_eq!(config.auth_lookup_timeout, Duration::from_millis(2_000));
    }

    #[test]
    fn secret_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing(JWT_SECRET_ENV));
    }

    #[test]
    fn short_or_malformed_secret_is_rejected() {
        // "short" in base64
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, "c2hvcnQ=")]),
            Err(ConfigError::Invalid { name: JWT_SECRET_ENV, .. })
        ));
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, "***")]),
            Err(ConfigError::Invalid { name: JWT_SECRET_ENV, .. })
        ));
    }

    #[test]
    fn numbers_are_validated() {
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, SECRET_B64), (PORT_ENV, "http")]),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, SECRET_B64), (JWT_TTL_SECS_ENV, "0")]),
            Err(ConfigError::Invalid { name: JWT_TTL_SECS_ENV, .. })
        ));
        let config = load(&[(JWT_SECRET_ENV, SECRET_B64), (JWT_TTL_SECS_ENV, "60")]).unwrap();
        assert_eq!(config.jwt_ttl, Duration::from_secs(60));
    }

    #[test]
    fn tls_paths_come_in_pairs() {
        assert!(load(&[(JWT_SECRET_ENV, SECRET_B64), (TLS_CERT_PATH_ENV, "cert.pem")]).is_err());

        let config = load(&[
            (JWT_SECRET_ENV, SECRET_B64),
            (TLS_CERT_PATH_ENV, "cert.pem"),
            (TLS_KEY_PATH_ENV, "key.pem"),
        ])
        .unwrap();
        assert_eq!(
            config.tls,
            Some((PathBuf::from("cert.pem"), PathBuf::from("key.pem")))
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let config = load(&[(JWT_SECRET_ENV, SECRET_B64)]).unwrap();
        assert!(!format!("{config:?}").contains("107"));
    }
}
