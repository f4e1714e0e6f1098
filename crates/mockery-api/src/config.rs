//! Configuration types and loading logic.
//!
//! The loaded [`MockConfig`] is validated once at startup. After that the
//! route definitions are treated as immutable for the life of the process.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use figment::providers::{Env, Format, Json, Toml};
use figment::Figment;
use mockery_tracing::TracingConfig;
use serde::{Deserialize, Deserializer};

/// Errors raised while loading or validating the mock configuration.
///
/// All of them are fatal at startup; none can surface while serving.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("failed to parse config: {0}")]
    Load(#[from] figment::Error),

    #[error("invalid port number: {0}")]
    InvalidPort(i64),

    #[error("route {index}: path cannot be empty")]
    EmptyPath { index: usize },

    #[error("invalid method {0}")]
    InvalidMethod(String),

    #[error("route {index}: authHeader required when requiresAuth is true")]
    MissingAuthHeader { index: usize },

    #[error("route {index}: invalid status code {status}")]
    InvalidStatus { index: usize, status: u16 },

    #[error("route {index}: invalid response header {name:?}")]
    InvalidHeader { index: usize, name: String },
}

/// Top-level mock server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MockConfig {
    pub server: ServerConfig,

    /// Route definitions in declaration order. Order is significant: the
    /// first matching route wins.
    #[serde(default)]
    pub routes: Vec<RouteDefinition>,

    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Server listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Kept signed so out-of-range values reach validation instead of
    /// failing as a type error.
    pub port: i64,

    #[serde(default = "default_host")]
    pub host: String,
}

/// HTTP methods a route may be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

/// One configured mapping from (method, path pattern) to a canned response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDefinition {
    pub path: String,

    pub method: HttpMethod,

    #[serde(default)]
    pub requires_auth: bool,

    /// Header whose presence (with a non-empty value) authorizes the request.
    #[serde(default)]
    pub auth_header: String,

    pub response: ResponseDefinition,
}

/// The canned response returned for a matched route.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseDefinition {
    pub status: u16,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// `None` when the key is omitted; `Some(Value::Null)` for an explicit
    /// `null`, which is still written as a payload.
    #[serde(default, deserialize_with = "present_value")]
    pub body: Option<serde_json::Value>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Deserialize a field that is present in the document, keeping `null`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 6] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method names are case-sensitive: `get` is rejected.
impl FromStr for HttpMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidMethod(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl MockConfig {
    /// Load configuration from a JSON (or `.toml`) file and environment
    /// variables, then validate it.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (MOCKERY_ prefix, __ for nesting)
    /// 2. Config file
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        let path = Path::new(config_path);
        if !path.is_file() {
            return Err(ConfigError::NotFound(config_path.to_string()));
        }

        let figment = if path.extension().is_some_and(|ext| ext == "toml") {
            Figment::new().merge(Toml::file(path))
        } else {
            Figment::new().merge(Json::file(path))
        };

        let config: MockConfig = figment
            .merge(Env::prefixed("MOCKERY_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the dispatch engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=65535).contains(&self.server.port) {
            return Err(ConfigError::InvalidPort(self.server.port));
        }

        for (index, route) in self.routes.iter().enumerate() {
            route.validate(index)?;
        }

        Ok(())
    }

    /// Port after validation.
    pub fn port(&self) -> u16 {
        u16::try_from(self.server.port).unwrap_or_default()
    }

    /// `host:port` the listener binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.port())
    }
}

impl RouteDefinition {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::EmptyPath { index });
        }
        if self.requires_auth && self.auth_header.is_empty() {
            return Err(ConfigError::MissingAuthHeader { index });
        }
        if StatusCode::from_u16(self.response.status).is_err() {
            return Err(ConfigError::InvalidStatus {
                index,
                status: self.response.status,
            });
        }
        if self.requires_auth && HeaderName::from_bytes(self.auth_header.as_bytes()).is_err() {
            return Err(ConfigError::InvalidHeader {
                index,
                name: self.auth_header.clone(),
            });
        }
        for (name, value) in &self.response.headers {
            let valid = HeaderName::from_bytes(name.as_bytes()).is_ok()
                && HeaderValue::from_str(value).is_ok();
            if !valid {
                return Err(ConfigError::InvalidHeader {
                    index,
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}
