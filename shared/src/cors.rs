//! Origin validation and CORS header selection.

use crate::Config;

/// Development origins, only honoured outside production.
pub const LOCALHOST_ORIGINS: [&str; 3] = [
    "http://localhost:8080",
    "http://localhost:8081",
    "http://localhost:5173",
];

/// Host suffixes of the hosted preview deployments.
pub const TRUSTED_HOST_SUFFIXES: [&str; 2] = [".lovable.app", ".lovableproject.com"];

/// Request headers the browser client is allowed to send.
pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

const WILDCARD: &str = "*";

/// Which origins may call the function with credentials.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origins: Vec<String>,
    trusted_suffixes: Vec<String>,
    production_url: Option<String>,
}

/// CORS headers computed for a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    pub allow_origin: String,
    pub allow_credentials: bool,
}

impl CorsHeaders {
    /// Header name/value pairs in emission order.
    pub fn pairs(&self) -> [(&'static str, String); 3] {
        [
            ("Access-Control-Allow-Origin", self.allow_origin.clone()),
            ("Access-Control-Allow-Headers", ALLOWED_HEADERS.to_string()),
            (
                "Access-Control-Allow-Credentials",
                self.allow_credentials.to_string(),
            ),
        ]
    }
}

/// A way of picking the `Access-Control-Allow-Origin` value, or `None` if it does not apply.
type OriginStrategy = fn(&OriginPolicy, Option<&str>) -> Option<String>;

/// Evaluated in order; the wildcard is the implicit last resort.
const ORIGIN_STRATEGIES: [OriginStrategy; 3] = [
    OriginPolicy::echo_allowed,
    OriginPolicy::first_allow_listed,
    OriginPolicy::configured_production_url,
];

impl OriginPolicy {
    pub fn new(
        allowed_origins: Vec<String>,
        trusted_suffixes: Vec<String>,
        production_url: Option<String>,
    ) -> Self {
        Self {
            allowed_origins,
            trusted_suffixes,
            production_url,
        }
    }

    /// Policy for the deployed function: localhost only in development.
    pub fn from_config(config: &Config) -> Self {
        let allowed_origins = if config.is_production {
            Vec::new()
        } else {
            LOCALHOST_ORIGINS.iter().map(|o| o.to_string()).collect()
        };

        Self::new(
            allowed_origins,
            TRUSTED_HOST_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            config.public_base_url.clone(),
        )
    }

    /// Whether `origin` may receive a credentialed response.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return false;
        };

        self.allowed_origins.iter().any(|allowed| allowed == origin)
            || self.has_trusted_host(origin)
            || self.production_url.as_deref() == Some(origin)
    }

    /// Compute CORS headers for a response. Never fails.
    pub fn cors_headers(&self, origin: Option<&str>) -> CorsHeaders {
        match ORIGIN_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(self, origin))
        {
            Some(allow_origin) => CorsHeaders {
                allow_origin,
                allow_credentials: true,
            },
            // Browsers refuse credentialed responses paired with a wildcard.
            None => CorsHeaders {
                allow_origin: WILDCARD.to_string(),
                allow_credentials: false,
            },
        }
    }

    fn has_trusted_host(&self, origin: &str) -> bool {
        let Ok(url) = reqwest::Url::parse(origin) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };

        self.trusted_suffixes
            .iter()
            .any(|suffix| host.ends_with(suffix.as_str()))
    }

    fn echo_allowed(&self, origin: Option<&str>) -> Option<String> {
        origin
            .filter(|origin| self.is_allowed(Some(*origin)))
            .map(str::to_string)
    }

    fn first_allow_listed(&self, _origin: Option<&str>) -> Option<String> {
        self.allowed_origins.first().cloned()
    }

    fn configured_production_url(&self, _origin: Option<&str>) -> Option<String> {
        self.production_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_policy() -> OriginPolicy {
        OriginPolicy::new(
            LOCALHOST_ORIGINS.iter().map(|o| o.to_string()).collect(),
            TRUSTED_HOST_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            Some("https://nights.example".to_string()),
        )
    }

    fn prod_policy(production_url: Option<&str>) -> OriginPolicy {
        OriginPolicy::new(
            Vec::new(),
            TRUSTED_HOST_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            production_url.map(str::to_string),
        )
    }

    #[test]
    fn test_rejects_missing_origin() {
        assert!(!dev_policy().is_allowed(None));
    }

    #[test]
    fn test_accepts_allow_list_and_production_url() {
        let policy = dev_policy();
        assert!(policy.is_allowed(Some("http://localhost:5173")));
        assert!(policy.is_allowed(Some("https://nights.example")));
    }

    #[test]
    fn test_accepts_trusted_preview_hosts() {
        let policy = prod_policy(None);
        assert!(policy.is_allowed(Some("https://my-app.lovable.app")));
        assert!(policy.is_allowed(Some("https://id-preview--abc.lovableproject.com")));
    }

    #[test]
    fn test_rejects_unknown_origins() {
        let policy = dev_policy();
        for origin in [
            "https://evil.example",
            "http://localhost:3000",
            "https://lovable.app.evil.example",
            "https://evil.example/?next=.lovable.app",
            "https://nights.example.evil.example",
            "not an origin",
        ] {
            assert!(!policy.is_allowed(Some(origin)), "{origin} should be rejected");
        }
    }

    #[test]
    fn test_production_drops_localhost() {
        let policy = prod_policy(Some("https://nights.example"));
        assert!(!policy.is_allowed(Some("http://localhost:8080")));
    }

    #[test]
    fn test_cors_echoes_allowed_origin() {
        let headers = dev_policy().cors_headers(Some("https://x.lovable.app"));
        assert_eq!(headers.allow_origin, "https://x.lovable.app");
        assert!(headers.allow_credentials);
    }

    #[test]
    fn test_cors_fallback_order() {
        let headers = dev_policy().cors_headers(Some("https://evil.example"));
        assert_eq!(headers.allow_origin, "http://localhost:8080");
        assert!(headers.allow_credentials);

        let headers = prod_policy(Some("https://nights.example")).cors_headers(None);
        assert_eq!(headers.allow_origin, "https://nights.example");
        assert!(headers.allow_credentials);
    }

    #[test]
    fn test_cors_wildcard_disables_credentials() {
        let headers = prod_policy(None).cors_headers(Some("https://evil.example"));
        assert_eq!(headers.allow_origin, "*");
        assert!(!headers.allow_credentials);

        let pairs = headers.pairs();
        assert_eq!(pairs[2], ("Access-Control-Allow-Credentials", "false".to_string()));
    }
}
