//! Client configuration.
//!
//! ```toml
//! base_url = "https://api.example.com/v1/"
//! route_policy = "reject_ambiguous"   # default: "first_wins"
//! ```
//!
//! Loading from TOML requires the `config` feature. Environment overrides
//! (`{PREFIX}_BASE_URL`, `{PREFIX}_ROUTE_POLICY`) are always available.

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::route::RoutePolicy;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// URL every route template is resolved against
    pub base_url: Url,
    /// Treatment of routes declaring several paths or verbs
    #[serde(default)]
    pub route_policy: RoutePolicy,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            route_policy: RoutePolicy::default(),
        }
    }

    /// Config for a base URL given as text.
    pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_base_url(base_url)?))
    }

    pub fn with_route_policy(mut self, policy: RoutePolicy) -> Self {
        self.route_policy = policy;
        self
    }

    /// Override fields from `{prefix}_BASE_URL` and `{prefix}_ROUTE_POLICY`.
    pub fn apply_env(self, prefix: &str) -> Result<Self, ConfigError> {
        self.apply_vars(prefix, |key| std::env::var(key).ok())
    }

    /// Like [`apply_env`](Self::apply_env), reading variables through `lookup`.
    pub fn apply_vars(
        mut self,
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(&format!("{prefix}_BASE_URL")) {
            self.base_url = parse_base_url(&value)?;
        }
        if let Some(value) = lookup(&format!("{prefix}_ROUTE_POLICY")) {
            self.route_policy =
                RoutePolicy::parse(&value).ok_or(ConfigError::InvalidRoutePolicy(value))?;
        }
        Ok(self)
    }

    /// Parse a TOML document.
    #[cfg(feature = "config")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    #[cfg(feature = "config")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_base_url() {
        let config = ClientConfig::parse("http://localhost:8080/api").unwrap();
        assert_eq!(config.base_url.path(), "/api");
        assert_eq!(config.route_policy, RoutePolicy::FirstWins);

        assert!(matches!(
            ClientConfig::parse("not a url"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SHOP_BASE_URL", "https://shop.example.com/"),
            ("SHOP_ROUTE_POLICY", "reject_ambiguous"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::parse("http://localhost")
            .unwrap()
            .apply_vars("SHOP", |key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url.as_str(), "https://shop.example.com/");
        assert_eq!(config.route_policy, RoutePolicy::RejectAmbiguous);
    }

    #[test]
    fn test_env_rejects_unknown_policy() {
        let err = ClientConfig::parse("http://localhost")
            .unwrap()
            .apply_vars("SHOP", |key| {
                (key == "SHOP_ROUTE_POLICY").then(|| "merge_all".to_string())
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoutePolicy(ref v) if v == "merge_all"));
    }

    #[test]
    fn test_deserialize() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "http://localhost:3000",
            "route_policy": "reject_ambiguous"
        }))
        .unwrap();
        assert_eq!(config.route_policy, RoutePolicy::RejectAmbiguous);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml_str("base_url = \"http://localhost:3000/v1/\"\n").unwrap();
        assert_eq!(config.base_url.path(), "/v1/");
        assert_eq!(config.route_policy, RoutePolicy::FirstWins);

        assert!(matches!(
            ClientConfig::from_toml_str("base_url = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
