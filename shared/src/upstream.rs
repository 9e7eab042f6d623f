//! Client for the Resident Advisor GraphQL events API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::models::EventData;
use crate::{Error, Result};

/// Upstream area identifier for New York.
pub const AREA_CODE: u32 = 8;

/// Listings requested per call. Only the first page is fetched, so busier days are truncated.
pub const PAGE_SIZE: u32 = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

// The API turns away requests that do not look like they come from its own site.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const SITE_REFERER: &str = "https://ra.co/events/us/newyork";
const SITE_ORIGIN: &str = "https://ra.co";

const EVENT_LISTINGS_QUERY: &str = r#"
query GET_EVENT_LISTINGS($filters: FilterInputDtoInput, $pageSize: Int, $page: Int) {
  eventListings(filters: $filters, pageSize: $pageSize, page: $page) {
    data {
      id
      listingDate
      event {
        id
        title
        attending
        date
        startTime
        endTime
        contentUrl
        flyerFront
        images {
          id
          filename
          alt
        }
        venue {
          id
          name
          contentUrl
        }
        artists {
          id
          name
        }
        pick {
          blurb
        }
      }
    }
    totalResults
  }
}
"#;

/// Anything that can supply the raw listings for a date.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self, date: &str) -> Result<Vec<EventData>>;
}

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: &'static str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ListingsData>,
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingsData {
    event_listings: Option<EventListings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListings {
    data: Option<Vec<EventData>>,
    total_results: Option<u64>,
}

/// Build the HTTP client shared by the upstream and rate-limit calls.
pub fn build_http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

fn listing_variables(date: &str) -> Value {
    json!({
        "filters": {
            "areas": { "eq": AREA_CODE },
            "listingDate": {
                "gte": date,
                "lte": date,
            },
        },
        "pageSize": PAGE_SIZE,
        "page": 1,
    })
}

/// Events API client.
pub struct RaClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl RaClient {
    pub fn new(http_client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EventSource for RaClient {
    /// Fetch the first page of listings for `date`.
    ///
    /// Status and body of failed calls are logged here; the returned error carries
    /// no upstream text.
    async fn fetch_events(&self, date: &str) -> Result<Vec<EventData>> {
        info!(date, "Fetching events");

        let request = GraphQlRequest {
            query: EVENT_LISTINGS_QUERY,
            variables: listing_variables(date),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Referer", SITE_REFERER)
            .header("Origin", SITE_ORIGIN)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Events API returned an error status");
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        let body: GraphQlResponse = response.json().await?;

        if let Some(errors) = body.errors {
            error!(errors = %errors, "Events API query returned errors");
            return Err(Error::Query);
        }

        let listings = body.data.and_then(|data| data.event_listings);
        let total_results = listings.as_ref().and_then(|l| l.total_results);
        let events = listings.and_then(|l| l.data).unwrap_or_default();

        if let Some(total) = total_results {
            if total > u64::from(PAGE_SIZE) {
                warn!(date, total, returned = events.len(), "Listings truncated to first page");
            }
        }

        info!(date, count = events.len(), "Found events");
        Ok(events)
    }
}
