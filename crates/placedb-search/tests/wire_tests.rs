use reqwest::StatusCode;
use serde_json::json;

use placedb_core::{Error, Region};
use placedb_search::client::classify_status;
use placedb_search::wire::{CountResponse, LocationRestriction, SearchTextRequest, SearchTextResponse};

#[test]
fn count_response_reads_total_count() {
    let body = json!({ "meta": { "total_count": 137, "pageable_count": 45, "is_end": false }, "documents": [] });
    let parsed: CountResponse = serde_json::from_value(body).unwrap();
    assert_eq!(parsed.meta.total_count, 137);
}

#[test]
fn search_text_response_maps_to_places() {
    let body = json!({
        "places": [
            {
                "id": "ChIJ-cafe",
                "displayName": { "text": "Blue Bottle", "languageCode": "ko" },
                "formattedAddress": "Seoul, Seongdong-gu",
                "location": { "latitude": 37.5446, "longitude": 127.0557 },
                "rating": 4.4,
                "userRatingCount": 812,
                "servesCoffee": true,
                "outdoorSeating": false,
                "paymentOptions": { "acceptsCreditCards": true },
                "parkingOptions": { "paidParkingLot": true },
                "reviews": [ { "text": { "text": "great\nlatte" } }, { "text": null } ],
                "regularOpeningHours": { "weekdayDescriptions": ["Monday: 8:00 AM – 10:00 PM"] }
            },
            { "id": "ChIJ-nowhere", "displayName": { "text": "No location" } }
        ],
        "nextPageToken": "tok-2"
    });
    let parsed: SearchTextResponse = serde_json::from_value(body).unwrap();
    assert_eq!(parsed.next_page_token.as_deref(), Some("tok-2"));

    let places: Vec<_> = parsed.places.into_iter().filter_map(|p| p.into_place()).collect();
    assert_eq!(places.len(), 1, "places without a location are dropped");
    let p = &places[0];
    assert_eq!(p.external_id, "ChIJ-cafe");
    assert_eq!(p.name, "Blue Bottle");
    assert_eq!(p.review_count, Some(812));
    assert_eq!(p.amenities.serves_coffee, Some(true));
    assert_eq!(p.amenities.outdoor_seating, Some(false));
    assert_eq!(p.amenities.takeout, None);
    assert_eq!(p.payment.as_ref().and_then(|o| o.accepts_credit_cards), Some(true));
    assert_eq!(p.parking.as_ref().and_then(|o| o.paid_parking_lot), Some(true));
    assert_eq!(p.reviews, vec!["great latte".to_string()]);
    assert_eq!(p.opening_hours.len(), 1);
}

#[test]
fn search_text_request_serializes_rectangle_restriction() {
    let region = Region::new(126.9, 37.5, 127.0, 37.6).unwrap();
    let req = SearchTextRequest {
        text_query: "cafe",
        included_type: Some("cafe"),
        language_code: "ko",
        region_code: "KR",
        page_token: None,
        location_restriction: LocationRestriction::from(&region),
    };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v["textQuery"], "cafe");
    assert_eq!(v["includedType"], "cafe");
    assert_eq!(v["locationRestriction"]["rectangle"]["low"]["latitude"], 37.5);
    assert_eq!(v["locationRestriction"]["rectangle"]["high"]["longitude"], 127.0);
    assert!(v.get("pageToken").is_none());
}

#[test]
fn statuses_map_onto_the_error_taxonomy() {
    assert!(matches!(classify_status(StatusCode::TOO_MANY_REQUESTS, ""), Error::UpstreamRateLimited { attempts: 1 }));
    assert!(matches!(classify_status(StatusCode::CONFLICT, "dup"), Error::UpstreamConflict(_)));
    assert!(matches!(classify_status(StatusCode::BAD_GATEWAY, ""), Error::Upstream(_)));
}
