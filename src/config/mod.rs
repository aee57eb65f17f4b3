use dotenv::dotenv;
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::common::DEFAULT_BUCKET;

/// Raw environment, deserialised by `envy` (`EDGE_DB_URL` -> `edge_db_url`).
#[derive(Debug, Clone, Deserialize)]
pub struct EnvConfig {
    pub edge_db_url: Option<String>,
    pub edge_db_service_role_key: Option<String>,
    pub bg_service_url: Option<String>,
    #[serde(default = "default_bucket")]
    pub storage_bucket: String,
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,
    #[serde(default = "default_transform_timeout_secs")]
    pub transform_timeout_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub mark_processing: bool,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_signed_url_ttl_secs() -> u64 {
    60
}

fn default_transform_timeout_secs() -> u64 {
    60
}

fn default_http_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("Failed to read environment")]
    Env(#[from] envy::Error),
}

/// Validated service configuration. Built once at startup and handed to the
/// orchestrator; nothing reads the environment after that.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the hosted API serving both `/rest/v1` and `/storage/v1`.
    pub db_url: String,
    /// Privileged key sent as `apikey` and bearer token.
    pub service_role_key: String,
    /// Background-removal endpoint.
    pub transform_url: String,
    pub bucket: String,
    pub signed_url_ttl: Duration,
    pub transform_timeout: Duration,
    pub http_timeout: Duration,
    /// Write `processing` before the transform runs.
    pub mark_processing: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("db_url", &self.db_url)
            .field("service_role_key", &"<redacted>")
            .field("transform_url", &self.transform_url)
            .field("bucket", &self.bucket)
            .field("signed_url_ttl", &self.signed_url_ttl)
            .field("transform_timeout", &self.transform_timeout)
            .field("http_timeout", &self.http_timeout)
            .field("mark_processing", &self.mark_processing)
            .finish()
    }
}

impl AppConfig {
    /// Build from an explicit list of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: EnvConfig = envy::from_iter(vars)?;
        Self::try_from(env)
    }
}

impl TryFrom<EnvConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(env: EnvConfig) -> Result<Self, Self::Error> {
        let db_url = non_blank(env.edge_db_url);
        let service_role_key = non_blank(env.edge_db_service_role_key);
        let transform_url = non_blank(env.bg_service_url);

        let mut missing = Vec::new();
        if db_url.is_none() {
            missing.push("EDGE_DB_URL");
        }
        if service_role_key.is_none() {
            missing.push("EDGE_DB_SERVICE_ROLE_KEY");
        }
        if transform_url.is_none() {
            missing.push("BG_SERVICE_URL");
        }

        let (Some(db_url), Some(service_role_key), Some(transform_url)) =
            (db_url, service_role_key, transform_url)
        else {
            return Err(ConfigError::Missing(missing));
        };

        require_url("EDGE_DB_URL", &db_url)?;
        require_url("BG_SERVICE_URL", &transform_url)?;

        let bucket = non_blank(Some(env.storage_bucket)).unwrap_or_else(default_bucket);

        Ok(Self {
            db_url,
            service_role_key,
            transform_url,
            bucket,
            signed_url_ttl: seconds("SIGNED_URL_TTL_SECS", env.signed_url_ttl_secs)?,
            transform_timeout: seconds("TRANSFORM_TIMEOUT_SECS", env.transform_timeout_secs)?,
            http_timeout: seconds("HTTP_TIMEOUT_SECS", env.http_timeout_secs)?,
            mark_processing: env.mark_processing,
        })
    }
}

/// Load `.env` (if present) and validate the process environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    dotenv().ok();
    AppConfig::from_vars(std::env::vars())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
        }),
    }
}

fn seconds(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::ZeroDuration { name });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> Vec<(String, String)> {
        vars(&[
            ("EDGE_DB_URL", "http://127.0.0.1:54321"),
            ("EDGE_DB_SERVICE_ROLE_KEY", "service-key"),
            ("BG_SERVICE_URL", "http://127.0.0.1:9000/remove-background"),
        ])
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = AppConfig::from_vars(required()).unwrap();
        assert_eq!(config.bucket, "wardrobe");
        assert_eq!(config.signed_url_ttl, Duration::from_secs(60));
        assert_eq!(config.transform_timeout, Duration::from_secs(60));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(!config.mark_processing);
    }

    #[test]
    fn optional_vars_override_defaults() {
        let mut env = required();
        env.extend(vars(&[
            ("STORAGE_BUCKET", "closet"),
            ("TRANSFORM_TIMEOUT_SECS", "5"),
            ("MARK_PROCESSING", "true"),
        ]));
        let config = AppConfig::from_vars(env).unwrap();
        assert_eq!(config.bucket, "closet");
        assert_eq!(config.transform_timeout, Duration::from_secs(5));
        assert!(config.mark_processing);
    }

    #[test]
    fn missing_vars_are_all_listed() {
        let error = AppConfig::from_vars(vars(&[("EDGE_DB_URL", "http://db")])).unwrap_err();
        match error {
            ConfigError::Missing(names) => {
                assert_eq!(names, vec!["EDGE_DB_SERVICE_ROLE_KEY", "BG_SERVICE_URL"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let env = vars(&[
            ("EDGE_DB_URL", "http://127.0.0.1:54321"),
            ("EDGE_DB_SERVICE_ROLE_KEY", "  "),
            ("BG_SERVICE_URL", "http://127.0.0.1:9000/remove-background"),
        ]);
        assert!(matches!(
            AppConfig::from_vars(env),
            Err(ConfigError::Missing(names)) if names == vec!["EDGE_DB_SERVICE_ROLE_KEY"]
        ));
    }

    #[test]
    fn non_http_transform_url_is_rejected() {
        let env: Vec<_> = required()
            .into_iter()
            .map(|(k, v)| {
                if k == "BG_SERVICE_URL" {
                    (k, "not a url".to_string())
                } else {
                    (k, v)
                }
            })
            .collect();
        assert!(matches!(
            AppConfig::from_vars(env),
            Err(ConfigError::InvalidUrl { name: "BG_SERVICE_URL", .. })
        ));
    }

    #[test]
    fn debug_output_hides_the_service_key() {
        let config = AppConfig::from_vars(required()).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("service-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
