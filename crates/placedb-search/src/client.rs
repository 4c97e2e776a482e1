use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use placedb_core::config::SearchSettings;
use placedb_core::traits::PlaceSearch;
use placedb_core::{CategoryQuery, Error, Place, Region, Result};

use crate::wire::{CountResponse, SearchTextRequest, SearchTextResponse};

/// HTTP client for the count probe (Kakao local search) and the paginated fetch
/// (Places text search).
pub struct HttpPlaceSearch {
    http: reqwest::Client,
    settings: SearchSettings,
}

impl HttpPlaceSearch {
    pub fn new(settings: SearchSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { http, settings })
    }
}

/// Maps a non-success status onto the error taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Error::UpstreamRateLimited { attempts: 1 },
        StatusCode::CONFLICT => Error::UpstreamConflict(body.to_string()),
        _ => Error::Upstream(format!("{status}: {body}")),
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify_status(status, body.trim()))
}

#[async_trait]
impl PlaceSearch for HttpPlaceSearch {
    async fn count(&self, region: &Region, query: &CategoryQuery) -> Result<u32> {
        let rect = region.to_string();
        let (url, filter) = match &query.group_code {
            Some(code) => (&self.settings.count_category_url, ("category_group_code", code.as_str())),
            None => (&self.settings.count_keyword_url, ("query", query.keyword.as_str())),
        };
        let params = [("page", "1"), ("size", "1"), ("sort", "accuracy"), ("rect", rect.as_str()), filter];
        let resp = self
            .http
            .get(url.as_str())
            .header(AUTHORIZATION, format!("KakaoAK {}", self.settings.count_api_key))
            .query(&params)
            .send()
            .await
            .map_err(Error::upstream)?;
        let body: CountResponse = check_status(resp).await?.json().await.map_err(Error::upstream)?;
        debug!(%region, count = body.meta.total_count, "count probe");
        Ok(body.meta.total_count)
    }

    async fn fetch(&self, region: &Region, query: &CategoryQuery) -> Result<Vec<Place>> {
        let mut places = Vec::new();
        let mut page_token: Option<String> = None;
        for page in 1..=self.settings.max_pages {
            let body = SearchTextRequest {
                text_query: &query.keyword,
                included_type: query.included_type.as_deref(),
                language_code: &self.settings.language_code,
                region_code: &self.settings.region_code,
                page_token: page_token.as_deref(),
                location_restriction: region.into(),
            };
            let resp = self
                .http
                .post(self.settings.fetch_url.as_str())
                .header("X-Goog-Api-Key", &self.settings.fetch_api_key)
                .header("X-Goog-FieldMask", &self.settings.field_mask)
                .json(&body)
                .send()
                .await
                .map_err(Error::upstream)?;
            let parsed: SearchTextResponse = check_status(resp).await?.json().await.map_err(Error::upstream)?;
            let n = parsed.places.len();
            places.extend(parsed.places.into_iter().filter_map(|p| p.into_place()));
            debug!(%region, page, n, "fetched page");
            match parsed.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) if page < self.settings.max_pages => page_token = Some(token),
                Some(_) => { warn!(%region, pages = page, "page limit reached with more results pending"); break; }
                None => break,
            }
        }
        Ok(places)
    }
}
