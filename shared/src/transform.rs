//! Mapping upstream listings onto the public event shape.

use crate::models::{EventData, EventRecord, UpstreamEvent, Venue};

/// Host serving upstream images.
pub const IMAGE_HOST: &str = "images.ra.co/";

/// Base URL for event pages.
pub const SITE_BASE_URL: &str = "https://ra.co";

/// Display name of the area the listings are scoped to.
pub const AREA_NAME: &str = "New York";

const UNKNOWN_VENUE: &str = "TBA";

/// Turn an upstream image reference into an absolute HTTPS URL.
pub fn normalize_image_url(src: &str) -> String {
    let src = src.trim();

    if src.starts_with("http") {
        return src.to_string();
    }
    if src.starts_with("//") {
        return format!("https:{}", src);
    }
    if let Some(pos) = src.find(IMAGE_HOST) {
        return format!("https://{}", &src[pos..]);
    }

    format!("https://{}{}", IMAGE_HOST, src.trim_start_matches('/'))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn image_source(event: &mut UpstreamEvent) -> Option<String> {
    non_empty(event.flyer_front.take()).or_else(|| {
        event
            .images
            .as_mut()
            .and_then(|images| images.first_mut())
            .and_then(Option::as_mut)
            .and_then(|image| non_empty(image.filename.take()))
    })
}

/// Negative counts become 0; counts beyond `u32` saturate.
fn clamp_attending(attending: Option<i64>) -> u32 {
    attending
        .map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Map one upstream listing to an [`EventRecord`]. Never fails.
pub fn transform(item: EventData) -> EventRecord {
    let mut event = item.event.unwrap_or_default();

    let image_url = image_source(&mut event).map(|src| normalize_image_url(&src));

    let venue_name = event
        .venue
        .and_then(|venue| non_empty(venue.name))
        .unwrap_or_else(|| UNKNOWN_VENUE.to_string());

    let artists = event
        .artists
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|artist| artist.name)
        .collect();

    let (is_pick, pick_blurb) = match event.pick {
        Some(pick) => (true, non_empty(pick.blurb)),
        None => (false, None),
    };

    EventRecord {
        id: event.id.unwrap_or_default(),
        title: event.title.unwrap_or_default(),
        date: event.date.unwrap_or_default(),
        start_time: event.start_time.unwrap_or_default(),
        end_time: event.end_time.unwrap_or_default(),
        url: format!("{}{}", SITE_BASE_URL, event.content_url.unwrap_or_default()),
        image_url,
        venue: Venue {
            name: venue_name,
            area: AREA_NAME.to_string(),
        },
        artists,
        attending: clamp_attending(event.attending),
        interested: 0,
        is_pick,
        pick_blurb,
    }
}

/// Transform every listing and order by attendance, most attended first.
///
/// The sort is stable, so equally attended events keep their upstream order.
pub fn transform_all(items: Vec<EventData>) -> Vec<EventRecord> {
    let mut events: Vec<EventRecord> = items.into_iter().map(transform).collect();
    events.sort_by(|a, b| b.attending.cmp(&a.attending));
    events
}
