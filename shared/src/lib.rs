//! Shared library for the nightlife listings serverless functions.
//!
//! This crate provides the origin policy, rate limiting, date validation, events API
//! client and event transformation used by the `scrape-events` function.

pub mod config;
pub mod cors;
pub mod dates;
pub mod error;
pub mod http;
pub mod models;
pub mod rate_limit;
pub mod transform;
pub mod upstash;
pub mod upstream;

pub use config::{Config, UpstashConfig};
pub use cors::{CorsHeaders, OriginPolicy};
pub use dates::{format_date, validate_date};
pub use error::{Error, Result};
pub use models::{ErrorBody, EventData, EventRecord, EventsResponse, Venue};
pub use rate_limit::{MemoryStore, RateLimitStore, RateLimiter};
pub use transform::{transform, transform_all};
pub use upstash::UpstashStore;
pub use upstream::{build_http_client, EventSource, RaClient};
