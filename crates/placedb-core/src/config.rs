//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml` and `APP_*`
//! env vars (`__` separates nesting, e.g. `APP_SEARCH__FETCH_API_KEY`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;
use crate::region::Region;
use crate::types::PlaceCategory;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Layers `figment` over the built-in defaults.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self.figment.extract().map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if matches!(env, "prod" | "production") {
            if settings.search.count_api_key.is_empty() || settings.search.fetch_api_key.is_empty() {
                return Err(Error::InvalidConfig("search api keys are required in production".into()).into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchSettings,
    pub retry: RetrySettings,
    pub partition: PartitionSettings,
    pub region: Region,
    pub store: StoreSettings,
    pub ingest: IngestSettings,
    pub funnel: FunnelSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            retry: RetrySettings::default(),
            partition: PartitionSettings::default(),
            region: Region::seoul(),
            store: StoreSettings::default(),
            ingest: IngestSettings::default(),
            funnel: FunnelSettings::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));
        if self.partition.result_cap == 0 { return invalid("partition.result_cap must be positive"); }
        if self.partition.concurrency == 0 { return invalid("partition.concurrency must be positive"); }
        if self.partition.seed_rows == 0 || self.partition.seed_cols == 0 { return invalid("partition seed grid must be positive"); }
        if self.retry.max_attempts == 0 { return invalid("retry.max_attempts must be positive"); }
        if self.funnel.filter_cap == 0 { return invalid("funnel.filter_cap must be positive"); }
        if !(self.funnel.threshold_step > 0.0) { return invalid("funnel.threshold_step must be positive"); }
        if self.ingest.batch_size == 0 { return invalid("ingest.batch_size must be positive"); }
        for category in PlaceCategory::ALL {
            let p = self.funnel.profile(category);
            if !(p.radius_km > 0.0) { return Err(Error::InvalidConfig(format!("funnel.{category}.radius_km must be positive"))); }
            if p.top_k == 0 { return Err(Error::InvalidConfig(format!("funnel.{category}.top_k must be positive"))); }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub count_category_url: String,
    pub count_keyword_url: String,
    pub fetch_url: String,
    pub count_api_key: String,
    pub fetch_api_key: String,
    pub field_mask: String,
    pub language_code: String,
    pub region_code: String,
    pub timeout_secs: u64,
    pub max_pages: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            count_category_url: "https://dapi.kakao.com/v2/local/search/category.json".into(),
            count_keyword_url: "https://dapi.kakao.com/v2/local/search/keyword.json".into(),
            fetch_url: "https://places.googleapis.com/v1/places:searchText".into(),
            count_api_key: String::new(),
            fetch_api_key: String::new(),
            field_mask: DEFAULT_FIELD_MASK.into(),
            language_code: "ko".into(),
            region_code: "KR".into(),
            timeout_secs: 10,
            max_pages: 5,
        }
    }
}

const DEFAULT_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.location,\
places.rating,places.userRatingCount,places.primaryTypeDisplayName,places.reviews,places.regularOpeningHours,\
places.paymentOptions,places.parkingOptions,places.allowsDogs,places.curbsidePickup,places.delivery,places.dineIn,\
places.goodForChildren,places.goodForGroups,places.goodForWatchingSports,places.liveMusic,places.menuForChildren,\
places.outdoorSeating,places.reservable,places.restroom,places.servesBeer,places.servesBreakfast,places.servesBrunch,\
places.servesCocktails,places.servesCoffee,places.servesDessert,places.servesDinner,places.servesLunch,\
places.servesVegetarianFood,places.servesWine,places.takeout,nextPageToken";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    /// Linear step: the wait after failed attempt `n` is `n × backoff_ms`.
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self { Self { max_attempts: 5, backoff_ms: 10_000 } }
}

/// What to do with a region still above the result cap once it can no longer be split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Report it and fetch nothing.
    #[default]
    Skip,
    /// Fetch whatever the upstream exposes and mark the leaf truncated.
    FetchCapped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionSettings {
    pub result_cap: u32,
    pub max_depth: u32,
    pub concurrency: usize,
    pub seed_rows: u32,
    pub seed_cols: u32,
    pub overflow: OverflowPolicy,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self { result_cap: 60, max_depth: 12, concurrency: 4, seed_rows: 10, seed_cols: 10, overflow: OverflowPolicy::Skip }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub uri: String,
    pub places_table: String,
    pub geo_table: String,
    pub markers_table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: "~/.placedb/lancedb".into(),
            places_table: "places".into(),
            geo_table: "geo_points".into(),
            markers_table: "markers".into(),
        }
    }
}

impl StoreSettings {
    pub fn resolved_uri(&self) -> PathBuf { expand_path(&self.uri) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub max_description_chars: usize,
    pub batch_size: usize,
}

impl Default for IngestSettings {
    fn default() -> Self { Self { max_description_chars: 7_400, batch_size: 64 } }
}

/// Per-category retrieval knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub radius_km: f64,
    /// Baseline for the adaptive attribute filter; `None` skips that stage.
    pub min_rating: Option<f64>,
    pub top_k: usize,
    pub min_similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelSettings {
    pub stage_timeout_ms: u64,
    pub filter_cap: usize,
    pub threshold_step: f64,
    pub threshold_ceiling: f64,
    pub parking: CategoryProfile,
    pub cafe: CategoryProfile,
    pub restaurant: CategoryProfile,
    pub activity: CategoryProfile,
}

impl Default for FunnelSettings {
    fn default() -> Self {
        Self {
            stage_timeout_ms: 3_000,
            filter_cap: 50,
            threshold_step: 0.2,
            threshold_ceiling: 4.2,
            parking: CategoryProfile { radius_km: 1.0, min_rating: None, top_k: 5, min_similarity: 0.2 },
            cafe: CategoryProfile { radius_km: 0.5, min_rating: Some(4.0), top_k: 5, min_similarity: 0.2 },
            restaurant: CategoryProfile { radius_km: 1.0, min_rating: Some(3.5), top_k: 5, min_similarity: 0.2 },
            activity: CategoryProfile { radius_km: 2.0, min_rating: Some(4.0), top_k: 3, min_similarity: 0.4 },
        }
    }
}

impl FunnelSettings {
    pub fn profile(&self, category: PlaceCategory) -> &CategoryProfile {
        match category {
            PlaceCategory::Parking => &self.parking,
            PlaceCategory::Cafe => &self.cafe,
            PlaceCategory::Restaurant => &self.restaurant,
            PlaceCategory::Activity => &self.activity,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
