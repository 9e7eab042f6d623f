//! Scrape Events Lambda - Serves one day of New York nightlife listings.
//!
//! Fetches listings from the Resident Advisor GraphQL API, normalizes them and
//! returns them sorted by attendance. Callers are checked against the origin
//! policy and rate limited per client address.

mod handler;

use lambda_http::{run, service_fn, Error};
use shared::Config;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::handler::{handler, AppState};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env()?;
    info!(
        production = config.is_production,
        upstash = config.upstash.is_some(),
        "Configuration loaded"
    );

    let state = Arc::new(AppState::from_config(&config)?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
