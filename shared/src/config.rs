//! Configuration management for the scrape-events function.

use std::env;

use crate::{Error, Result};

/// Default GraphQL endpoint of the events API.
pub const DEFAULT_GRAPHQL_URL: &str = "https://ra.co/graphql";

/// Credentials for the Upstash Redis REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstashConfig {
    /// REST base URL, without trailing slash
    pub url: String,
    /// Bearer token
    pub token: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Production mode disables the localhost origins
    pub is_production: bool,
    /// Public base URL of the deployed site
    pub public_base_url: Option<String>,
    /// External rate-limit store (if configured)
    pub upstash: Option<UpstashConfig>,
    /// Events API endpoint
    pub graphql_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let is_production = var("ENVIRONMENT").as_deref() == Some("production")
            || var("DEPLOYMENT_ID").is_some();

        let public_base_url = var("PUBLIC_BASE_URL")
            .or_else(|| var("SUPABASE_URL"))
            .map(|url| url.trim_end_matches('/').to_string());

        // Half-configured Upstash is treated as absent so the in-process store takes over.
        let upstash = match (var("UPSTASH_REDIS_REST_URL"), var("UPSTASH_REDIS_REST_TOKEN")) {
            (Some(url), Some(token)) => Some(UpstashConfig {
                url: url.trim_end_matches('/').to_string(),
                token,
            }),
            _ => None,
        };

        let graphql_url = var("EVENTS_GRAPHQL_URL").unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string());
        if reqwest::Url::parse(&graphql_url).is_err() {
            return Err(Error::Config(format!(
                "EVENTS_GRAPHQL_URL is not a valid URL: {}",
                graphql_url
            )));
        }

        Ok(Self {
            is_production,
            public_base_url,
            upstash,
            graphql_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(!config.is_production);
        assert_eq!(config.public_base_url, None);
        assert_eq!(config.upstash, None);
        assert_eq!(config.graphql_url, DEFAULT_GRAPHQL_URL);
    }

    #[test]
    fn test_production_flags() {
        assert!(config_from(&[("ENVIRONMENT", "production")]).unwrap().is_production);
        assert!(config_from(&[("DEPLOYMENT_ID", "abc123")]).unwrap().is_production);
        assert!(!config_from(&[("ENVIRONMENT", "staging")]).unwrap().is_production);
    }

    #[test]
    fn test_public_url_fallback_and_trim() {
        let config = config_from(&[("SUPABASE_URL", "https://proj.supabase.co/")]).unwrap();
        assert_eq!(config.public_base_url.as_deref(), Some("https://proj.supabase.co"));

        let config = config_from(&[
            ("PUBLIC_BASE_URL", "https://nights.example"),
            ("SUPABASE_URL", "https://proj.supabase.co"),
        ])
        .unwrap();
        assert_eq!(config.public_base_url.as_deref(), Some("https://nights.example"));
    }

    #[test]
    fn test_upstash_requires_url_and_token() {
        let config = config_from(&[("UPSTASH_REDIS_REST_URL", "https://redis.example")]).unwrap();
        assert_eq!(config.upstash, None);

        let config = config_from(&[
            ("UPSTASH_REDIS_REST_URL", "https://redis.example/"),
            ("UPSTASH_REDIS_REST_TOKEN", "secret"),
        ])
        .unwrap();
        assert_eq!(
            config.upstash,
            Some(UpstashConfig {
                url: "https://redis.example".to_string(),
                token: "secret".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_invalid_graphql_url() {
        let result = config_from(&[("EVENTS_GRAPHQL_URL", "not a url")]);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
