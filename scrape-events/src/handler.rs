//! Request pipeline for the scrape-events endpoint.
//!
//! Every response, including errors and preflight, carries the CORS headers
//! computed from the request origin. Steps run in order and the first failure
//! decides the response: origin check (403), rate limit (429), date validation
//! (400), upstream fetch (500).

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use lambda_http::http::Method;
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde_json::Value;
use shared::http::{error_response, json_response_with_headers, preflight_response};
use shared::{
    build_http_client, format_date, transform_all, validate_date, Config, EventSource,
    EventsResponse, OriginPolicy, RaClient, RateLimitStore, RateLimiter, UpstashStore,
};
use tracing::{error, info, warn};

/// Client key used when the caller's address is unknown.
const UNKNOWN_CLIENT: &str = "unknown";

const CACHE_CONTROL: &str = "public, max-age=300";

/// Application state shared across requests.
pub struct AppState {
    pub origin_policy: OriginPolicy,
    pub rate_limiter: RateLimiter,
    pub events: Arc<dyn EventSource>,
}

impl AppState {
    pub fn from_config(config: &Config) -> shared::Result<Self> {
        let http_client = build_http_client()?;

        let primary_store = config.upstash.as_ref().map(|upstash| {
            Arc::new(UpstashStore::new(http_client.clone(), upstash)) as Arc<dyn RateLimitStore>
        });
        if primary_store.is_none() {
            warn!("Upstash not configured, rate limiting is per instance only");
        }

        Ok(Self {
            origin_policy: OriginPolicy::from_config(config),
            rate_limiter: RateLimiter::with_fallback(primary_store),
            events: Arc::new(RaClient::new(http_client, config.graphql_url.clone())),
        })
    }
}

fn header_str<'a>(event: &'a Request, name: &str) -> Option<&'a str> {
    event
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// First forwarded address, then the CDN's connecting IP, then a shared sentinel.
fn client_key(event: &Request) -> String {
    header_str(event, "x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(event, "cf-connecting-ip"))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

fn body_date(body: &Body) -> Option<String> {
    let value: Value = serde_json::from_slice(body.as_ref()).ok()?;
    value.get("date")?.as_str().map(str::to_string)
}

/// The date to serve: POST body, else query string, else today.
fn requested_date(event: &Request, today: NaiveDate) -> String {
    if event.method() == Method::POST {
        if let Some(date) = body_date(event.body()) {
            return date;
        }
    }

    event
        .query_string_parameters()
        .first("date")
        .filter(|date| !date.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format_date(today))
}

pub async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let origin = header_str(&event, "origin");
    let cors = state.origin_policy.cors_headers(origin);

    if event.method() == Method::OPTIONS {
        return preflight_response(&cors);
    }

    // Browsers enforce CORS themselves; this also stops non-browser callers.
    if !state.origin_policy.is_allowed(origin) {
        warn!(origin = ?origin, "Rejected request from disallowed origin");
        return error_response(&shared::Error::ForbiddenOrigin, &cors);
    }

    let client = client_key(&event);
    if state.rate_limiter.is_rate_limited(&client).await {
        let retry_after_secs = state.rate_limiter.retry_after_secs();
        return error_response(&shared::Error::RateLimited { retry_after_secs }, &cors);
    }

    let today = Utc::now().date_naive();
    let raw_date = requested_date(&event, today);
    let Some(date) = validate_date(&raw_date, today) else {
        info!(date = %raw_date, "Rejected invalid date");
        return error_response(&shared::Error::InvalidDate(raw_date.clone()), &cors);
    };

    info!(date, client = %client, "Processing request");

    let listings = match state.events.fetch_events(date).await {
        Ok(listings) => listings,
        Err(e) => {
            error!(error = %e, error_debug = ?e, "Error in scrape-events function");
            return error_response(&e, &cors);
        }
    };

    let response = EventsResponse::new(date, transform_all(listings));
    json_response_with_headers(200, &cors, &[("Cache-Control", CACHE_CONTROL)], &response)
}
