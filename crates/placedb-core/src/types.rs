//! Domain types shared by discovery, ingestion and retrieval.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::filter::FilterExpr;
use crate::geo::GeoPoint;

/// Place categories the system discovers and serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceCategory {
    Parking,
    Cafe,
    Restaurant,
    Activity,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 4] = [Self::Parking, Self::Cafe, Self::Restaurant, Self::Activity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parking => "parking",
            Self::Cafe => "cafe",
            Self::Restaurant => "restaurant",
            Self::Activity => "activity",
        }
    }

    /// Key of the geo index partition holding this category's points.
    pub fn geo_key(&self) -> String { format!("places:{}", self.as_str()) }

    /// Marker set recording regions whose places have been stored.
    pub fn processed_regions_key(&self) -> String { format!("regions:{}:processed", self.as_str()) }

    pub fn default_query(&self) -> CategoryQuery {
        let (keyword, included_type, group_code) = match self {
            Self::Parking => ("parking", "parking", Some("PK6")),
            Self::Cafe => ("cafe", "cafe", Some("CE7")),
            Self::Restaurant => ("restaurant", "restaurant", Some("FD6")),
            Self::Activity => ("tourist attraction", "tourist_attraction", None),
        };
        CategoryQuery {
            keyword: keyword.to_string(),
            included_type: Some(included_type.to_string()),
            group_code: group_code.map(str::to_string),
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for PlaceCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parking" | "parking_lot" | "parkinglot" => Ok(Self::Parking),
            "cafe" | "café" => Ok(Self::Cafe),
            "restaurant" => Ok(Self::Restaurant),
            "activity" | "attraction" | "tourist_attraction" => Ok(Self::Activity),
            other => Err(Error::InvalidArgument(format!("unknown place category '{other}'"))),
        }
    }
}

/// What to ask the upstream APIs for.
///
/// - `keyword`: free-text query for the fetch API, and for the count API when no group code is set
/// - `included_type`: fetch API place type restriction
/// - `group_code`: count API category group (e.g. `CE7` for cafés)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQuery {
    pub keyword: String,
    pub included_type: Option<String>,
    pub group_code: Option<String>,
}

impl CategoryQuery {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self { keyword: keyword.into(), included_type: None, group_code: None }
    }
}

/// Optional service flags. Field names follow the upstream camelCase wire format so the
/// search client can deserialize them directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amenities {
    pub allows_dogs: Option<bool>,
    pub curbside_pickup: Option<bool>,
    pub delivery: Option<bool>,
    pub dine_in: Option<bool>,
    pub good_for_children: Option<bool>,
    pub good_for_groups: Option<bool>,
    pub good_for_watching_sports: Option<bool>,
    pub live_music: Option<bool>,
    pub menu_for_children: Option<bool>,
    pub outdoor_seating: Option<bool>,
    pub reservable: Option<bool>,
    pub restroom: Option<bool>,
    pub serves_beer: Option<bool>,
    pub serves_breakfast: Option<bool>,
    pub serves_brunch: Option<bool>,
    pub serves_cocktails: Option<bool>,
    pub serves_coffee: Option<bool>,
    pub serves_dessert: Option<bool>,
    pub serves_dinner: Option<bool>,
    pub serves_lunch: Option<bool>,
    pub serves_vegetarian_food: Option<bool>,
    pub serves_wine: Option<bool>,
    pub takeout: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOptions {
    pub accepts_credit_cards: Option<bool>,
    pub accepts_debit_cards: Option<bool>,
    pub accepts_cash_only: Option<bool>,
}

impl PaymentOptions {
    pub fn is_empty(&self) -> bool {
        self.accepts_credit_cards.is_none() && self.accepts_debit_cards.is_none() && self.accepts_cash_only.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingOptions {
    pub free_parking_lot: Option<bool>,
    pub paid_parking_lot: Option<bool>,
    pub free_street_parking: Option<bool>,
    pub paid_street_parking: Option<bool>,
    pub valet_parking: Option<bool>,
    pub free_garage_parking: Option<bool>,
    pub paid_garage_parking: Option<bool>,
}

/// One upstream search hit. `external_id` is the only stable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub location: GeoPoint,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub primary_type: Option<String>,
    #[serde(default)]
    pub amenities: Amenities,
    pub payment: Option<PaymentOptions>,
    pub parking: Option<ParkingOptions>,
    #[serde(default)]
    pub reviews: Vec<String>,
    #[serde(default)]
    pub opening_hours: Vec<String>,
}

impl Place {
    pub fn new(external_id: impl Into<String>, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
            address: String::new(),
            location,
            rating: None,
            review_count: None,
            primary_type: None,
            amenities: Amenities::default(),
            payment: None,
            parking: None,
            reviews: Vec::new(),
            opening_hours: Vec::new(),
        }
    }

    pub fn rating_or_zero(&self) -> f64 { self.rating.unwrap_or(0.0) }
    pub fn review_count_or_zero(&self) -> u32 { self.review_count.unwrap_or(0) }
}

/// A point stored in the geo index under a category key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPlace {
    pub category_key: String,
    pub place_id: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceMetadata {
    pub external_id: String,
    pub name: String,
    pub category: PlaceCategory,
    pub location: GeoPoint,
    pub address: String,
    pub rating: f64,
    pub review_count: u32,
}

/// Unit of storage in the vector store; `id` is `stable_hash(metadata.external_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub description: String,
    pub metadata: PlaceMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: VectorRecord,
    /// Cosine similarity in `[-1, 1]`, higher is closer.
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct SimilarityRequest {
    pub query: String,
    pub top_k: usize,
    pub min_similarity: f32,
    pub filter: Option<FilterExpr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub location: GeoPoint,
    /// Falls back to the category's configured radius.
    pub radius_km: Option<f64>,
    pub mood: String,
    pub category: PlaceCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlace {
    pub external_id: String,
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
    pub rating: f64,
    pub review_count: u32,
    pub description: String,
    pub score: f32,
}

impl From<ScoredRecord> for RankedPlace {
    fn from(s: ScoredRecord) -> Self {
        let m = s.record.metadata;
        Self {
            external_id: m.external_id,
            name: m.name,
            address: m.address,
            location: m.location,
            rating: m.rating,
            review_count: m.review_count,
            description: s.record.description,
            score: s.score,
        }
    }
}
