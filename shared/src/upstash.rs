//! Rate-limit counters in Upstash Redis, over its REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use urlencoding::encode;

use crate::config::UpstashConfig;
use crate::rate_limit::RateLimitStore;
use crate::{Error, Result};

/// Increments `KEYS[1]` and starts its expiry on the first hit, in one server-side step.
const INCREMENT_SCRIPT: &str = "local current = redis.call('INCR', KEYS[1])
if current == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current";

/// Body of every Upstash REST reply.
#[derive(Debug, Deserialize)]
struct UpstashReply {
    #[serde(default)]
    result: Value,
    error: Option<String>,
}

/// [`RateLimitStore`] backed by Upstash Redis.
pub struct UpstashStore {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl UpstashStore {
    pub fn new(http_client: reqwest::Client, config: &UpstashConfig) -> Self {
        Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    async fn command(&self, path: &str) -> Result<Value> {
        let response = self
            .http_client
            .get(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Upstash returned {}: {}",
                status, error_text
            )));
        }

        let reply: UpstashReply = response.json().await?;
        if let Some(error) = reply.error {
            return Err(Error::Store(format!("Upstash command failed: {}", error)));
        }

        Ok(reply.result)
    }
}

/// Redis integers arrive as JSON numbers from EVAL and as strings from GET.
fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl RateLimitStore for UpstashStore {
    fn name(&self) -> &'static str {
        "upstash"
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<u64> {
        let path = format!(
            "eval/{}/1/{}/{}",
            encode(INCREMENT_SCRIPT),
            encode(key),
            window.as_secs().max(1)
        );

        let result = self.command(&path).await?;
        parse_count(&result)
            .ok_or_else(|| Error::Store(format!("Unexpected EVAL result: {}", result)))
    }

    async fn get(&self, key: &str) -> Result<Option<u64>> {
        let result = self.command(&format!("get/{}", encode(key))).await?;
        if result.is_null() {
            return Ok(None);
        }

        parse_count(&result)
            .map(Some)
            .ok_or_else(|| Error::Store(format!("Unexpected GET result: {}", result)))
    }
}
