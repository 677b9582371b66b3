//! # Client Configuration
//!
//! [`ClientConfig`] is plain data: it can be built in code or deserialized from JSON, and the CLI
//! merges it with command-line flags before building a client.
use crate::grpc_web::frame::DEFAULT_MAX_MESSAGE_SIZE;
use http::Uri;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL '{url}': '{source}'")]
    InvalidUrl {
        url: String,
        source: http::uri::InvalidUri,
    },
    #[error("URL '{0}' must include a scheme and a host (e.g. http://localhost:8080)")]
    NotAbsolute(String),
    #[error("Failed to parse configuration: '{0}'")]
    Parse(#[from] serde_json::Error),
}

/// Client settings.
///
/// In JSON the deadline is written as `timeout_ms`. Files that still carry `timeout_secs` are
/// read too; `timeout_ms` wins when both are present.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the gRPC-Web endpoint. A path component is kept as a prefix for every method.
    pub url: String,
    /// Bearer token sent with every call unless the call overrides it.
    pub auth_token: Option<String>,
    /// Largest response message accepted, in bytes.
    pub max_message_size: usize,
    /// Default deadline for unary calls.
    #[serde(rename = "timeout_ms", serialize_with = "serialize_millis")]
    pub timeout: Option<Duration>,
}

/// The JSON shape of [`ClientConfig`].
#[derive(Deserialize)]
#[serde(default)]
struct ConfigFile {
    url: String,
    auth_token: Option<String>,
    max_message_size: usize,
    timeout_ms: Option<u64>,
    timeout_secs: Option<u64>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let defaults = ClientConfig::default();
        Self {
            url: defaults.url,
            auth_token: defaults.auth_token,
            max_message_size: defaults.max_message_size,
            timeout_ms: None,
            timeout_secs: None,
        }
    }
}

impl<'de> Deserialize<'de> for ClientConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let file = ConfigFile::deserialize(deserializer)?;
        let timeout = match (file.timeout_ms, file.timeout_secs) {
            (Some(ms), _) => Some(Duration::from_millis(ms)),
            (None, Some(secs)) => Some(Duration::from_secs(secs)),
            (None, None) => None,
        };

        Ok(Self {
            url: file.url,
            auth_token: file.auth_token,
            max_message_size: file.max_message_size,
            timeout,
        })
    }
}

fn serialize_millis<S: Serializer>(
    timeout: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    timeout
        .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
        .serialize(serializer)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            auth_token: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Parses [`ClientConfig::url`], requiring a scheme and an authority.
    pub fn base_uri(&self) -> Result<Uri, ConfigError> {
        let uri = Uri::from_str(&self.url).map_err(|source| ConfigError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(ConfigError::NotAbsolute(self.url.clone()));
        }

        Ok(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ClientConfig::from_json(r#"{ "url": "http://lfg.example:8080" }"#).unwrap();

        assert_eq!(config.url, "http://lfg.example:8080");
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(config.auth_token, None);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn sub_second_timeout_is_kept() {
        let config = ClientConfig::default().with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn timeout_is_read_in_milliseconds() {
        let config = ClientConfig::from_json(r#"{ "timeout_ms": 250 }"#).unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn legacy_timeout_secs_is_still_read() {
        let config = ClientConfig::from_json(r#"{ "timeout_secs": 15 }"#).unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));

        let both = ClientConfig::from_json(r#"{ "timeout_secs": 15, "timeout_ms": 1500 }"#).unwrap();
        assert_eq!(both.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn timeout_is_written_in_milliseconds() {
        let config = ClientConfig::default().with_timeout(Duration::from_millis(1500));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout_ms"], 1500);

        let back: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn relative_url_is_rejected() {
        let err = ClientConfig::new("/lfg.Lfg").base_uri().unwrap_err();
        assert!(matches!(err, ConfigError::NotAbsolute(_)));
    }

    #[test]
    fn base_uri_keeps_path_prefix() {
        let uri = ClientConfig::new("https://api.example.com/grpc")
            .base_uri()
            .unwrap();
        assert_eq!(uri.path(), "/grpc");
    }
}
