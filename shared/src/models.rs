//! Upstream and public data models.

use serde::{Deserialize, Serialize};

/// One listing as returned by the events API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub listing_date: Option<String>,
    #[serde(default)]
    pub event: Option<UpstreamEvent>,
}

/// Event details nested inside a listing. Any field may be missing, and list
/// entries may be null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamEvent {
    pub id: Option<String>,
    pub title: Option<String>,
    pub attending: Option<i64>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub content_url: Option<String>,
    pub flyer_front: Option<String>,
    pub images: Option<Vec<Option<UpstreamImage>>>,
    pub venue: Option<UpstreamVenue>,
    pub artists: Option<Vec<Option<UpstreamArtist>>>,
    pub pick: Option<UpstreamPick>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamImage {
    pub id: Option<String>,
    pub filename: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamVenue {
    pub id: Option<String>,
    pub name: Option<String>,
    pub content_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamArtist {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Editorial pick marker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamPick {
    pub blurb: Option<String>,
}

/// Event as served to the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub url: String,
    pub image_url: Option<String>,
    pub venue: Venue,
    pub artists: Vec<String>,
    pub attending: u32,
    pub interested: u32,
    pub is_pick: bool,
    pub pick_blurb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Venue {
    pub name: String,
    pub area: String,
}

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub date: String,
    pub events: Vec<EventRecord>,
    pub count: usize,
}

impl EventsResponse {
    pub fn new(date: impl Into<String>, events: Vec<EventRecord>) -> Self {
        Self {
            date: date.into(),
            count: events.len(),
            events,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_with_nulls() {
        let json = r#"{
            "id": "l1",
            "listingDate": "2024-06-15T00:00:00.000",
            "event": {
                "id": "e1",
                "title": "Warehouse",
                "attending": null,
                "flyerFront": null,
                "images": [],
                "venue": null,
                "artists": [{"id": "a1", "name": "DJ One"}],
                "pick": null
            }
        }"#;

        let listing: EventData = serde_json::from_str(json).unwrap();
        let event = listing.event.unwrap();
        assert_eq!(event.id.as_deref(), Some("e1"));
        assert_eq!(event.attending, None);
        assert!(event.venue.is_none());
        assert!(event.pick.is_none());
        let artists = event.artists.unwrap();
        assert_eq!(artists[0].as_ref().unwrap().name.as_deref(), Some("DJ One"));
    }

    #[test]
    fn test_parse_page_with_null_entries_and_negative_attendance() {
        let json = r#"[
            {"event": {"images": [null], "artists": [{"name": "A"}, null], "attending": -1}},
            {"event": {"id": "e2"}}
        ]"#;

        let listings: Vec<EventData> = serde_json::from_str(json).unwrap();
        assert_eq!(listings.len(), 2);

        let event = listings[0].event.as_ref().unwrap();
        assert!(event.images.as_ref().unwrap()[0].is_none());
        assert!(event.artists.as_ref().unwrap()[1].is_none());
        assert_eq!(event.attending, Some(-1));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = EventRecord {
            id: "e1".into(),
            title: "Warehouse".into(),
            date: "2024-06-15T00:00:00.000".into(),
            start_time: "2024-06-15T22:00:00.000".into(),
            end_time: String::new(),
            url: "https://ra.co/events/1".into(),
            image_url: None,
            venue: Venue {
                name: "TBA".into(),
                area: "New York".into(),
            },
            artists: vec![],
            attending: 3,
            interested: 0,
            is_pick: true,
            pick_blurb: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["startTime"], "2024-06-15T22:00:00.000");
        assert_eq!(value["imageUrl"], serde_json::Value::Null);
        assert_eq!(value["isPick"], true);
        assert_eq!(value["pickBlurb"], serde_json::Value::Null);
        assert_eq!(value["venue"]["area"], "New York");
    }

    #[test]
    fn test_events_response_count_matches() {
        let response = EventsResponse::new("2024-06-15", vec![]);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, serde_json::json!({"date": "2024-06-15", "events": [], "count": 0}));
    }

    #[test]
    fn test_parse_listing_with_null_event() {
        let listing: EventData = serde_json::from_str(r#"{"id": "l1", "event": null}"#).unwrap();
        assert!(listing.event.is_none());
    }
}
