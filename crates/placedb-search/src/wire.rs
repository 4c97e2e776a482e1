//! Request and response bodies of the two upstream APIs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use placedb_core::types::{Amenities, ParkingOptions, PaymentOptions};
use placedb_core::{GeoPoint, Place, Region};

#[derive(Debug, Deserialize)]
pub struct CountResponse {
    pub meta: CountMeta,
}

#[derive(Debug, Deserialize)]
pub struct CountMeta {
    pub total_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextRequest<'a> {
    pub text_query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_type: Option<&'a str>,
    pub language_code: &'a str,
    pub region_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<&'a str>,
    pub location_restriction: LocationRestriction,
}

#[derive(Debug, Serialize)]
pub struct LocationRestriction {
    pub rectangle: Rectangle,
}

#[derive(Debug, Serialize)]
pub struct Rectangle {
    pub low: LatLng,
    pub high: LatLng,
}

#[derive(Debug, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Region> for LocationRestriction {
    fn from(r: &Region) -> Self {
        Self {
            rectangle: Rectangle {
                low: LatLng { latitude: r.south(), longitude: r.west() },
                high: LatLng { latitude: r.north(), longitude: r.east() },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextResponse {
    #[serde(default)]
    pub places: Vec<WirePlace>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePlace {
    pub id: Option<String>,
    pub display_name: Option<LocalizedText>,
    pub formatted_address: Option<String>,
    pub location: Option<WireLocation>,
    pub rating: Option<f64>,
    pub user_rating_count: Option<u32>,
    pub primary_type_display_name: Option<LocalizedText>,
    #[serde(default)]
    pub reviews: Vec<WireReview>,
    pub regular_opening_hours: Option<OpeningHours>,
    pub payment_options: Option<PaymentOptions>,
    pub parking_options: Option<ParkingOptions>,
    #[serde(flatten)]
    pub amenities: Amenities,
}

#[derive(Debug, Deserialize)]
pub struct LocalizedText {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct WireReview {
    pub text: Option<LocalizedText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_descriptions: Vec<String>,
}

impl WirePlace {
    /// `None` when the hit lacks an id or a usable location.
    pub fn into_place(self) -> Option<Place> {
        let Some(id) = self.id.filter(|id| !id.is_empty()) else {
            debug!("dropping place without id");
            return None;
        };
        let Some(loc) = self.location.and_then(|l| GeoPoint::new(l.latitude, l.longitude).ok()) else {
            debug!(id = %id, "dropping place without a valid location");
            return None;
        };
        let name = self.display_name.and_then(|t| t.text).unwrap_or_else(|| id.clone());
        Some(Place {
            external_id: id,
            name,
            address: self.formatted_address.unwrap_or_default(),
            location: loc,
            rating: self.rating,
            review_count: self.user_rating_count,
            primary_type: self.primary_type_display_name.and_then(|t| t.text),
            amenities: self.amenities,
            payment: self.payment_options,
            parking: self.parking_options,
            reviews: self
                .reviews
                .into_iter()
                .filter_map(|r| r.text.and_then(|t| t.text))
                .map(|t| t.replace('\0', "").replace('\n', " "))
                .filter(|t| !t.trim().is_empty())
                .collect(),
            opening_hours: self.regular_opening_hours.map(|h| h.weekday_descriptions).unwrap_or_default(),
        })
    }
}
